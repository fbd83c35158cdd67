//! The editor seam.
//!
//! The text-editing surface is external. During a preview the coordinator
//! owns its read-only flag and tells it what to display.

use revscope_diff::{DiffHunk, DiffSummary, FileTreeNode};

use crate::version::Sha;

/// What the editor should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// The live, editable workspace.
    Live,
    /// A preview whose diff has not arrived yet.
    Loading { sha: Sha },
    /// A parsed version diff.
    Version {
        sha: Sha,
        hunks: Vec<DiffHunk>,
        summary: DiffSummary,
        tree: Option<FileTreeNode>,
    },
    /// The version changed nothing.
    NoChanges { sha: Sha },
    /// The diff could not be fetched.
    Unavailable {
        sha: Sha,
        reason: String,
    },
}

impl ContentSource {
    pub fn is_live(&self) -> bool {
        matches!(self, ContentSource::Live)
    }
}

/// Operations the editor exposes to the coordinator.
pub trait Editor: Send {
    fn set_read_only(&mut self, read_only: bool);

    fn set_displayed_content(&mut self, source: ContentSource);
}
