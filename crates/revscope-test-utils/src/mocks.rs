//! Mock implementations for testing.
//!
//! Provides test doubles for the versioning backend and the editor so
//! sessions can be driven without a real service or UI.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use revscope_core::{
    ClientError, ClientResult, ContentSource, CreateOutcome, DiffResponse, Editor, ListResponse,
    RequestKind, Sha, TreeResponse, VersionControl, VersionEntry,
};
use tokio::sync::Notify;

/// An in-memory versioning backend.
///
/// Records every call, applies creates and deletes to its own version list,
/// and can be told to fail or to hold a call until released.
///
/// # Example
///
/// ```rust
/// use revscope_core::{RequestKind, Sha};
/// use revscope_test_utils::{fixtures, MockVersionControl};
///
/// let backend = MockVersionControl::new()
///     .with_versions(fixtures::versions(&["v0", "v1", "v2"]))
///     .with_diff("v1", fixtures::SAMPLE_DIFF, fixtures::sample_stats());
///
/// // Hold diffs of v1 until the test releases them.
/// backend.hold(RequestKind::Diff, &Sha::new("v1"));
/// ```
#[derive(Clone, Default)]
pub struct MockVersionControl {
    state: Arc<Mutex<MockState>>,
    /// Held calls, keyed by operation and target.
    gates: Arc<Mutex<HashMap<(RequestKind, Option<Sha>), Arc<Notify>>>>,
}

#[derive(Default)]
struct MockState {
    /// Newest first.
    versions: Vec<VersionEntry>,
    unavailable: bool,
    failures: HashMap<RequestKind, ClientError>,
    diffs: HashMap<Sha, DiffResponse>,
    trees: HashMap<Sha, TreeResponse>,
    calls: Vec<MockCall>,
    /// Whether the next create has something to save.
    dirty: bool,
    created: u64,
}

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub kind: RequestKind,
    pub sha: Option<Sha>,
    pub project_id: String,
    /// Label passed to create, if any.
    pub label: Option<String>,
}

impl MockVersionControl {
    /// Create an empty, available backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version list (newest first).
    pub fn with_versions(self, versions: Vec<VersionEntry>) -> Self {
        self.state.lock().unwrap().versions = versions;
        self
    }

    /// Configure the diff returned for `sha`.
    pub fn with_diff(self, sha: &str, diff: &str, files: Vec<revscope_diff::FileStat>) -> Self {
        self.state.lock().unwrap().diffs.insert(
            Sha::new(sha),
            DiffResponse {
                diff: diff.to_string(),
                files,
            },
        );
        self
    }

    /// Configure the file listing returned for `sha`.
    pub fn with_tree(self, sha: &str, files: &[&str]) -> Self {
        self.state.lock().unwrap().trees.insert(
            Sha::new(sha),
            TreeResponse {
                files: files.iter().map(|f| f.to_string()).collect(),
            },
        );
        self
    }

    /// Report version control as disabled.
    pub fn unavailable(self) -> Self {
        self.state.lock().unwrap().unavailable = true;
        self
    }

    /// Make every call of `kind` fail with `error` until cleared.
    pub fn fail(&self, kind: RequestKind, error: ClientError) {
        self.state.lock().unwrap().failures.insert(kind, error);
    }

    pub fn clear_failure(&self, kind: RequestKind) {
        self.state.lock().unwrap().failures.remove(&kind);
    }

    /// Give the next create something to save.
    pub fn mark_dirty(&self) {
        self.state.lock().unwrap().dirty = true;
    }

    /// Hold calls of `kind` targeting `sha` until [`release`](Self::release).
    pub fn hold(&self, kind: RequestKind, sha: &Sha) {
        self.gates
            .lock()
            .unwrap()
            .insert((kind, Some(sha.clone())), Arc::new(Notify::new()));
    }

    /// Let a held call complete.
    pub fn release(&self, kind: RequestKind, sha: Option<&Sha>) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&(kind, sha.cloned())) {
            gate.notify_one();
        }
    }

    /// Current version list.
    pub fn versions(&self) -> Vec<VersionEntry> {
        self.state.lock().unwrap().versions.clone()
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Recorded calls of one kind.
    pub fn calls_of(&self, kind: RequestKind) -> Vec<MockCall> {
        self.calls().into_iter().filter(|c| c.kind == kind).collect()
    }

    /// Get the number of calls of one kind.
    pub fn call_count(&self, kind: RequestKind) -> usize {
        self.calls_of(kind).len()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    async fn enter(
        &self,
        kind: RequestKind,
        sha: Option<&Sha>,
        project_id: &str,
        label: Option<&str>,
    ) -> ClientResult<()> {
        self.state.lock().unwrap().calls.push(MockCall {
            kind,
            sha: sha.cloned(),
            project_id: project_id.to_string(),
            label: label.map(str::to_string),
        });

        let gate = self
            .gates
            .lock()
            .unwrap()
            .get(&(kind, sha.cloned()))
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(ClientError::Unavailable);
        }
        match state.failures.get(&kind) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn unknown(sha: &Sha) -> ClientError {
    ClientError::failed(format!("unknown version {sha}"))
}

#[async_trait]
impl VersionControl for MockVersionControl {
    async fn list(&self, project_id: &str) -> ClientResult<ListResponse> {
        match self.enter(RequestKind::List, None, project_id, None).await {
            Ok(()) => Ok(ListResponse::Versions(self.versions())),
            Err(ClientError::Unavailable) => Ok(ListResponse::Unavailable),
            Err(err) => Err(err),
        }
    }

    async fn create(&self, project_id: &str, label: Option<&str>) -> ClientResult<CreateOutcome> {
        self.enter(RequestKind::Create, None, project_id, label)
            .await?;

        let mut state = self.state.lock().unwrap();
        if !std::mem::take(&mut state.dirty) {
            return Ok(CreateOutcome::default());
        }
        state.created += 1;
        let sha = Sha::new(format!("new{}", state.created));
        let mut entry = VersionEntry::new(sha.clone(), label.unwrap_or("Saved version"));
        entry.is_user_version = true;
        state.versions.insert(0, entry);
        Ok(CreateOutcome {
            sha: Some(sha),
            note: None,
        })
    }

    async fn diff(&self, sha: &Sha, project_id: &str) -> ClientResult<DiffResponse> {
        self.enter(RequestKind::Diff, Some(sha), project_id, None)
            .await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .diffs
            .get(sha)
            .cloned()
            .unwrap_or_default())
    }

    async fn tree(&self, sha: &Sha, project_id: &str) -> ClientResult<TreeResponse> {
        self.enter(RequestKind::Tree, Some(sha), project_id, None)
            .await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .trees
            .get(sha)
            .cloned()
            .unwrap_or_default())
    }

    async fn rollback(&self, sha: &Sha, project_id: &str) -> ClientResult<()> {
        self.enter(RequestKind::Rollback, Some(sha), project_id, None)
            .await?;
        let state = self.state.lock().unwrap();
        if state.versions.iter().any(|v| &v.sha == sha) {
            Ok(())
        } else {
            Err(unknown(sha))
        }
    }

    async fn delete(&self, sha: &Sha, project_id: &str) -> ClientResult<()> {
        self.enter(RequestKind::Delete, Some(sha), project_id, None)
            .await?;
        let mut state = self.state.lock().unwrap();
        let before = state.versions.len();
        state.versions.retain(|v| &v.sha != sha);
        if state.versions.len() == before {
            return Err(unknown(sha));
        }
        Ok(())
    }
}

/// A call made on [`RecordingEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCall {
    SetReadOnly(bool),
    SetContent(ContentSource),
}

/// An editor that records what it is told to do.
///
/// Clones share the same log, so a test can hand one clone to the session
/// and inspect the other.
#[derive(Clone, Default)]
pub struct RecordingEditor {
    calls: Arc<Mutex<Vec<EditorCall>>>,
}

impl RecordingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EditorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Return and clear the recorded calls.
    pub fn take_calls(&self) -> Vec<EditorCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// The read-only flag as last set; editors start writable.
    pub fn is_read_only(&self) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|call| match call {
                EditorCall::SetReadOnly(flag) => Some(*flag),
                EditorCall::SetContent(_) => None,
            })
            .unwrap_or(false)
    }

    /// The content as last set; editors start on live content.
    pub fn content(&self) -> ContentSource {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|call| match call {
                EditorCall::SetContent(source) => Some(source.clone()),
                EditorCall::SetReadOnly(_) => None,
            })
            .unwrap_or(ContentSource::Live)
    }
}

impl Editor for RecordingEditor {
    fn set_read_only(&mut self, read_only: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(EditorCall::SetReadOnly(read_only));
    }

    fn set_displayed_content(&mut self, source: ContentSource) {
        self.calls
            .lock()
            .unwrap()
            .push(EditorCall::SetContent(source));
    }
}
