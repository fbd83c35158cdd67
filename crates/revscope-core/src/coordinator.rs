//! Keeps the editor in step with the navigator.
//!
//! Entering a preview makes the editor read-only and fetches the version's
//! diff (and its file tree when the tree view is on). Leaving the preview
//! restores a writable editor showing live content. A fetch that completes
//! after its version stopped being the active one is dropped.

use revscope_diff::{DiffHunk, DiffSummary, FileTreeNode};
use tracing::{debug, info, warn};

use crate::client::{ClientResult, DiffResponse, TreeResponse};
use crate::editor::{ContentSource, Editor};
use crate::error::HistoryError;
use crate::navigator::{NavMode, NavigatorState};
use crate::request::{Dispatcher, RequestKind, RequestToken};
use crate::version::Sha;

/// What a renderer needs to draw the active preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewView {
    pub sha: Sha,
    /// True until the diff arrives.
    pub loading: bool,
    pub hunks: Vec<DiffHunk>,
    pub summary: DiffSummary,
    /// Present only while the tree view is on and the tree has arrived.
    pub tree: Option<FileTreeNode>,
    /// Why the diff could not be shown.
    pub failure: Option<String>,
}

#[derive(Debug)]
enum DiffState {
    Loading,
    Loaded {
        hunks: Vec<DiffHunk>,
        summary: DiffSummary,
    },
    Failed(String),
}

#[derive(Debug)]
struct ActivePreview {
    sha: Sha,
    diff_request: u64,
    tree_request: Option<u64>,
    diff: DiffState,
    tree: Option<FileTreeNode>,
}

pub struct PreviewCoordinator {
    editor: Box<dyn Editor>,
    dispatcher: Dispatcher,
    project_id: String,
    tree_view: bool,
    active: Option<ActivePreview>,
    last_error: Option<HistoryError>,
    /// Set when a fetch reported version control as disabled.
    lost_backend: bool,
}

impl PreviewCoordinator {
    pub fn new(
        project_id: impl Into<String>,
        editor: Box<dyn Editor>,
        dispatcher: Dispatcher,
        tree_view: bool,
    ) -> Self {
        Self {
            editor,
            dispatcher,
            project_id: project_id.into(),
            tree_view,
            active: None,
            last_error: None,
            lost_backend: false,
        }
    }

    pub fn tree_view(&self) -> bool {
        self.tree_view
    }

    pub fn is_previewing(&self) -> bool {
        self.active.is_some()
    }

    pub fn last_error(&self) -> Option<&HistoryError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Whether a fetch since the last call found version control disabled.
    pub(crate) fn take_lost_backend(&mut self) -> bool {
        std::mem::take(&mut self.lost_backend)
    }

    /// Whether a diff or tree fetch for the active preview is outstanding.
    pub fn has_pending(&self) -> bool {
        self.active.as_ref().is_some_and(|a| {
            matches!(a.diff, DiffState::Loading) || (a.tree_request.is_some() && a.tree.is_none())
        })
    }

    /// Bring the editor in line with `state`.
    pub fn sync(&mut self, state: &NavigatorState) {
        match &state.mode {
            NavMode::Editing => {
                if let Some(active) = self.active.take() {
                    info!(sha = %active.sha.short(), "Restoring live editor");
                    self.editor.set_read_only(false);
                    self.editor.set_displayed_content(ContentSource::Live);
                }
            }
            NavMode::Previewing(sha) => {
                if self.active.as_ref().is_some_and(|a| &a.sha == sha) {
                    return;
                }
                if self.active.is_none() {
                    self.editor.set_read_only(true);
                }
                self.activate(sha.clone());
            }
        }
    }

    fn activate(&mut self, sha: Sha) {
        debug!(sha = %sha, tree_view = self.tree_view, "Fetching preview");
        let diff_request = self.dispatcher.diff(&sha, &self.project_id).seq;
        let tree_request = self
            .tree_view
            .then(|| self.dispatcher.tree(&sha, &self.project_id).seq);
        self.active = Some(ActivePreview {
            sha,
            diff_request,
            tree_request,
            diff: DiffState::Loading,
            tree: None,
        });
        self.display();
    }

    /// Turn the tree view on or off. Turning it on while previewing fetches
    /// the tree unless it was already fetched for this version.
    pub fn set_tree_view(&mut self, on: bool) {
        if self.tree_view == on {
            return;
        }
        self.tree_view = on;
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if on && active.tree_request.is_none() {
            active.tree_request = Some(self.dispatcher.tree(&active.sha, &self.project_id).seq);
        }
        self.display();
    }

    fn is_current(&self, token: &RequestToken, seq: impl Fn(&ActivePreview) -> Option<u64>) -> bool {
        let current = token.project_id == self.project_id
            && self
                .active
                .as_ref()
                .is_some_and(|a| token.targets(&a.sha) && seq(a) == Some(token.seq));
        if !current {
            debug!(seq = token.seq, sha = ?token.sha, kind = ?token.kind, "Dropping stale preview response");
        }
        current
    }

    /// Apply a diff completion. Returns `false` if the response was stale.
    pub fn on_diff(&mut self, token: &RequestToken, result: ClientResult<DiffResponse>) -> bool {
        if !self.is_current(token, |a| Some(a.diff_request)) {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        match result {
            Ok(response) => {
                let hunks = revscope_diff::parse(&response.diff, &response.files);
                let summary = DiffSummary::from_hunks(&hunks);
                debug!(sha = %active.sha, files = summary.files, "Diff loaded");
                active.diff = DiffState::Loaded { hunks, summary };
            }
            Err(err) => {
                let err = HistoryError::from_client(RequestKind::Diff, err);
                warn!(sha = %active.sha, %err, "Diff fetch failed");
                active.diff = DiffState::Failed(err.to_string());
                self.record_failure(err);
            }
        }
        self.display();
        true
    }

    /// Apply a tree completion. Returns `false` if the response was stale.
    pub fn on_tree(&mut self, token: &RequestToken, result: ClientResult<TreeResponse>) -> bool {
        if !self.is_current(token, |a| a.tree_request) {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        match result {
            Ok(response) => {
                let tree = revscope_diff::build(&response.files);
                debug!(sha = %active.sha, files = tree.file_count(), "Tree loaded");
                active.tree = Some(tree);
            }
            Err(err) => {
                let err = HistoryError::from_client(RequestKind::Tree, err);
                warn!(sha = %active.sha, %err, "Tree fetch failed");
                // Allow a retry by toggling the tree view.
                active.tree_request = None;
                self.record_failure(err);
            }
        }
        self.display();
        true
    }

    fn record_failure(&mut self, err: HistoryError) {
        if err.is_persistent() {
            self.lost_backend = true;
        } else {
            self.last_error = Some(err);
        }
    }

    /// Forget the active preview's fetches and adopt `project_id`.
    ///
    /// The editor is restored if a preview was showing.
    pub fn reset(&mut self, project_id: impl Into<String>) {
        self.sync(&NavigatorState::default());
        self.project_id = project_id.into();
        self.last_error = None;
        self.lost_backend = false;
    }

    /// The active preview, if any.
    pub fn view(&self) -> Option<PreviewView> {
        let active = self.active.as_ref()?;
        let (loading, hunks, summary, failure) = match &active.diff {
            DiffState::Loading => (true, Vec::new(), DiffSummary::default(), None),
            DiffState::Loaded { hunks, summary } => (false, hunks.clone(), *summary, None),
            DiffState::Failed(reason) => {
                (false, Vec::new(), DiffSummary::default(), Some(reason.clone()))
            }
        };
        Some(PreviewView {
            sha: active.sha.clone(),
            loading,
            hunks,
            summary,
            tree: self.visible_tree(active),
            failure,
        })
    }

    fn visible_tree(&self, active: &ActivePreview) -> Option<FileTreeNode> {
        if self.tree_view {
            active.tree.clone()
        } else {
            None
        }
    }

    fn display(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let sha = active.sha.clone();
        let source = match &active.diff {
            DiffState::Loading => ContentSource::Loading { sha },
            DiffState::Failed(reason) => ContentSource::Unavailable {
                sha,
                reason: reason.clone(),
            },
            DiffState::Loaded { hunks, .. } if hunks.is_empty() => ContentSource::NoChanges { sha },
            DiffState::Loaded { hunks, summary } => ContentSource::Version {
                sha,
                hunks: hunks.clone(),
                summary: *summary,
                tree: self.visible_tree(active),
            },
        };
        self.editor.set_displayed_content(source);
    }
}
