//! Diff and tree reconstruction for revscope.
//!
//! Everything here is pure and synchronous: the versioning backend hands us a
//! raw unified diff plus per-file stats, or a flat list of paths, and these
//! modules turn them into structures a renderer can walk.
//!
//! - [`parser`]: unified diff text into per-file, line-typed hunks
//! - [`tree`]: flat relative paths into a nested directory/file tree

pub mod parser;
pub mod tree;
mod types;

pub use parser::{parse, parse_range_header, HunkRange};
pub use tree::{build, FileTreeNode, TreeRow};
pub use types::{DiffHunk, DiffLine, DiffLineKind, DiffSummary, FileStat};
