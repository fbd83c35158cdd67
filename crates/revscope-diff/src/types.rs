//! Diff data structures.
//!
//! All of these are derived per fetch and never persisted.

use serde::{Deserialize, Serialize};

/// Per-file change counts as reported by the versioning backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Repository-relative path.
    pub path: String,
    /// Lines added in this file.
    #[serde(default)]
    pub additions: u32,
    /// Lines removed from this file.
    #[serde(default)]
    pub deletions: u32,
}

impl FileStat {
    pub fn new(path: impl Into<String>, additions: u32, deletions: u32) -> Self {
        Self {
            path: path.into(),
            additions,
            deletions,
        }
    }
}

/// What a rendered diff line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    /// An `@@ -a,b +c,d @@` range marker.
    Header,
    /// Unchanged line present on both sides.
    Context,
    /// Line present only in the new version.
    Addition,
    /// Line present only in the old version.
    Deletion,
}

/// A single rendered line of a file diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    /// Line text without the `+`/`-`/` ` prefix. Header lines keep the raw text.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line_number: Option<u32>,
}

impl DiffLine {
    pub fn header(text: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Header,
            text: text.into(),
            old_line_number: None,
            new_line_number: None,
        }
    }

    pub fn context(text: impl Into<String>, old: u32, new: u32) -> Self {
        Self {
            kind: DiffLineKind::Context,
            text: text.into(),
            old_line_number: Some(old),
            new_line_number: Some(new),
        }
    }

    pub fn addition(text: impl Into<String>, new: u32) -> Self {
        Self {
            kind: DiffLineKind::Addition,
            text: text.into(),
            old_line_number: None,
            new_line_number: Some(new),
        }
    }

    pub fn deletion(text: impl Into<String>, old: u32) -> Self {
        Self {
            kind: DiffLineKind::Deletion,
            text: text.into(),
            old_line_number: Some(old),
            new_line_number: None,
        }
    }

    /// The marker character a unified diff uses for this line.
    pub fn prefix(&self) -> &'static str {
        match self.kind {
            DiffLineKind::Header => "",
            DiffLineKind::Context => " ",
            DiffLineKind::Addition => "+",
            DiffLineKind::Deletion => "-",
        }
    }
}

/// All changes to one file between two versions.
///
/// `additions` and `deletions` mirror the backend's per-file stats. They are
/// never recomputed from `lines`, which exist for rendering only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub file: String,
    pub additions: u32,
    pub deletions: u32,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Create a hunk with no lines yet.
    pub fn new(file: impl Into<String>, additions: u32, deletions: u32) -> Self {
        Self {
            file: file.into(),
            additions,
            deletions,
            lines: Vec::new(),
        }
    }

    /// Number of `@@` range markers in this file.
    pub fn header_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind == DiffLineKind::Header)
            .count()
    }
}

/// Totals across a parsed diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub files: u32,
    pub additions: u32,
    pub deletions: u32,
}

impl DiffSummary {
    /// Sum the stat-mirrored counts of every hunk.
    pub fn from_hunks(hunks: &[DiffHunk]) -> Self {
        hunks.iter().fold(Self::default(), |acc, hunk| Self {
            files: acc.files.saturating_add(1),
            additions: acc.additions.saturating_add(hunk.additions),
            deletions: acc.deletions.saturating_add(hunk.deletions),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.files == 0
    }
}
