//! The version navigation state machine.
//!
//! [`VersionNavigator`] owns the version list and the preview mode. Local
//! moves (`start_preview`, `navigate`, `stop_preview`) take effect at once.
//! Mutations (`rollback`, `delete`, `create`) only issue a backend request;
//! their effect is committed when the completion arrives through one of the
//! `on_*` handlers.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::{ClientError, ClientResult, CreateOutcome, ListResponse};
use crate::error::{HistoryError, HistoryResult};
use crate::request::{Dispatcher, RequestKind, RequestToken};
use crate::version::{Sha, VersionList};

/// Shown when a create finds nothing to save and the backend sent no note.
pub const NO_CHANGES_NOTICE: &str = "No changes to save";

/// Live editing or read-only preview of one version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum NavMode {
    #[default]
    Editing,
    Previewing(Sha),
}

/// Direction of a step through history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the initial version.
    Older,
    /// Towards the head.
    Newer,
}

/// Whether the project has version control at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Availability {
    /// No list has completed yet.
    #[default]
    Unknown,
    Available,
    /// Version control is disabled; mutating operations are refused.
    Unavailable,
}

/// Snapshot of what the navigator shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigatorState {
    pub mode: NavMode,
    pub project_id: String,
    pub versions: VersionList,
}

impl NavigatorState {
    pub fn active_sha(&self) -> Option<&Sha> {
        match &self.mode {
            NavMode::Previewing(sha) => Some(sha),
            NavMode::Editing => None,
        }
    }

    pub fn is_previewing(&self) -> bool {
        matches!(self.mode, NavMode::Previewing(_))
    }
}

pub struct VersionNavigator {
    state: NavigatorState,
    dispatcher: Dispatcher,
    availability: Availability,
    /// Sequence number of the newest list request still outstanding.
    latest_list: Option<u64>,
    /// Rollbacks and deletes awaiting completion.
    mutations: Vec<RequestToken>,
    pending_create: Option<RequestToken>,
    last_error: Option<HistoryError>,
    notice: Option<String>,
}

impl VersionNavigator {
    pub fn new(project_id: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            state: NavigatorState {
                project_id: project_id.into(),
                ..Default::default()
            },
            dispatcher,
            availability: Availability::Unknown,
            latest_list: None,
            mutations: Vec::new(),
            pending_create: None,
            last_error: None,
            notice: None,
        }
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn mode(&self) -> &NavMode {
        &self.state.mode
    }

    pub fn active_sha(&self) -> Option<&Sha> {
        self.state.active_sha()
    }

    pub fn versions(&self) -> &VersionList {
        &self.state.versions
    }

    pub fn project_id(&self) -> &str {
        &self.state.project_id
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn last_error(&self) -> Option<&HistoryError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Whether a rollback or delete of `sha` is still in flight.
    pub fn is_busy(&self, sha: &Sha) -> bool {
        self.mutations.iter().any(|token| token.targets(sha))
    }

    /// Whether any request this navigator issued is still outstanding.
    pub fn has_pending(&self) -> bool {
        self.latest_list.is_some() || !self.mutations.is_empty() || self.pending_create.is_some()
    }

    pub fn can_rollback(&self, sha: &Sha) -> bool {
        self.allowed(sha, RequestKind::Rollback)
    }

    pub fn can_delete(&self, sha: &Sha) -> bool {
        self.allowed(sha, RequestKind::Delete)
    }

    fn allowed(&self, sha: &Sha, operation: RequestKind) -> bool {
        self.availability != Availability::Unavailable
            && self.state.versions.guard(sha, operation).is_ok()
            && !self.is_busy(sha)
    }

    fn ensure_available(&self) -> HistoryResult<()> {
        match self.availability {
            Availability::Unavailable => Err(HistoryError::CollaboratorUnavailable),
            _ => Ok(()),
        }
    }

    fn ensure_idle(&self, sha: &Sha) -> HistoryResult<()> {
        if self.is_busy(sha) {
            Err(HistoryError::Busy { sha: sha.clone() })
        } else {
            Ok(())
        }
    }

    /// Fetch the version list. Only the newest list request is ever applied.
    pub fn load(&mut self) -> RequestToken {
        let token = self.dispatcher.list(&self.state.project_id);
        self.latest_list = Some(token.seq);
        token
    }

    pub fn refresh(&mut self) -> RequestToken {
        self.load()
    }

    /// Enter preview of `sha`, or jump to it if already previewing.
    ///
    /// Like [`navigate`](Self::navigate), a jump neither leaves nor lands on
    /// a version with a rollback or delete in flight.
    pub fn start_preview(&mut self, sha: &Sha) -> HistoryResult<()> {
        if !self.state.versions.contains(sha) {
            return Err(HistoryError::NotInHistory(sha.clone()));
        }
        if let Some(current) = self.state.active_sha().filter(|current| *current != sha) {
            self.ensure_idle(current)?;
        }
        self.ensure_idle(sha)?;
        info!(sha = %sha.short(), project = %self.state.project_id, "Starting preview");
        self.state.mode = NavMode::Previewing(sha.clone());
        Ok(())
    }

    /// Step to the adjacent version. Returns `false` at either end of history.
    pub fn navigate(&mut self, direction: Direction) -> HistoryResult<bool> {
        let current = self
            .state
            .active_sha()
            .cloned()
            .ok_or(HistoryError::NotPreviewing)?;

        let target = match direction {
            Direction::Older => self.state.versions.older(&current),
            Direction::Newer => self.state.versions.newer(&current),
        };
        let Some(target) = target.map(|r| r.sha().clone()) else {
            debug!(sha = %current, ?direction, "Already at the end of history");
            return Ok(false);
        };

        self.ensure_idle(&current)?;
        self.ensure_idle(&target)?;

        debug!(from = %current, to = %target, ?direction, "Navigating");
        self.state.mode = NavMode::Previewing(target);
        Ok(true)
    }

    /// Return to live editing. Returns `false` if not previewing.
    ///
    /// Always allowed; a pending rollback of the previewed version still
    /// lands the navigator in live editing when it completes.
    pub fn stop_preview(&mut self) -> bool {
        match std::mem::take(&mut self.state.mode) {
            NavMode::Previewing(sha) => {
                info!(sha = %sha.short(), "Stopping preview");
                true
            }
            NavMode::Editing => false,
        }
    }

    /// Roll the workspace back to the previewed version.
    pub fn rollback(&mut self) -> HistoryResult<RequestToken> {
        let sha = self
            .state
            .active_sha()
            .cloned()
            .ok_or(HistoryError::NotPreviewing)?;
        self.ensure_available()?;
        self.state.versions.guard(&sha, RequestKind::Rollback)?;
        self.ensure_idle(&sha)?;

        info!(sha = %sha.short(), project = %self.state.project_id, "Requesting rollback");
        let token = self.dispatcher.rollback(&sha, &self.state.project_id);
        self.mutations.push(token.clone());
        Ok(token)
    }

    /// Delete `sha`.
    ///
    /// If `sha` is being previewed, the preview first moves to the older
    /// neighbour (or the newer one if there is none) so the view never rests
    /// on a version that is about to disappear. The move is not undone if the
    /// delete fails.
    pub fn delete(&mut self, sha: &Sha) -> HistoryResult<RequestToken> {
        self.ensure_available()?;
        self.state.versions.guard(sha, RequestKind::Delete)?;
        self.ensure_idle(sha)?;

        if self.state.active_sha() == Some(sha) {
            let neighbour = self
                .state
                .versions
                .older(sha)
                .or_else(|| self.state.versions.newer(sha))
                .map(|r| r.sha().clone());
            match neighbour {
                Some(next) => {
                    self.ensure_idle(&next)?;
                    debug!(from = %sha, to = %next, "Moving preview off deleted version");
                    self.state.mode = NavMode::Previewing(next);
                }
                None => {
                    self.stop_preview();
                }
            }
        }

        info!(sha = %sha.short(), project = %self.state.project_id, "Requesting delete");
        let token = self.dispatcher.delete(sha, &self.state.project_id);
        self.mutations.push(token.clone());
        Ok(token)
    }

    /// Save the current workspace as a new version.
    pub fn create(&mut self, label: Option<String>) -> HistoryResult<RequestToken> {
        self.ensure_available()?;
        if self.pending_create.is_some() {
            return Err(HistoryError::CreateInFlight);
        }
        info!(project = %self.state.project_id, label = ?label, "Requesting new version");
        let token = self.dispatcher.create(&self.state.project_id, label);
        self.pending_create = Some(token.clone());
        Ok(token)
    }

    /// Forget everything about the current project and adopt `project_id`.
    pub fn reset(&mut self, project_id: impl Into<String>) {
        let project_id = project_id.into();
        info!(from = %self.state.project_id, to = %project_id, "Switching project");
        self.state = NavigatorState {
            project_id,
            ..Default::default()
        };
        self.availability = Availability::Unknown;
        self.latest_list = None;
        self.mutations.clear();
        self.pending_create = None;
        self.last_error = None;
        self.notice = None;
    }

    fn is_foreign(&self, token: &RequestToken) -> bool {
        if token.project_id != self.state.project_id {
            debug!(
                seq = token.seq,
                project = %token.project_id,
                "Dropping response for another project"
            );
            return true;
        }
        false
    }

    fn record_failure(&mut self, operation: RequestKind, err: ClientError) {
        let err = HistoryError::from_client(operation, err);
        warn!(%err, "History request failed");
        if err.is_persistent() {
            self.mark_unavailable();
        } else {
            self.last_error = Some(err);
        }
    }

    pub(crate) fn mark_unavailable(&mut self) {
        if self.availability != Availability::Unavailable {
            info!(project = %self.state.project_id, "Version control is unavailable");
        }
        self.availability = Availability::Unavailable;
        self.state.versions = VersionList::default();
        self.state.mode = NavMode::Editing;
    }

    /// Apply a list completion. Returns `false` if the response was stale.
    pub fn on_listed(&mut self, token: &RequestToken, result: ClientResult<ListResponse>) -> bool {
        if self.is_foreign(token) {
            return false;
        }
        if self.latest_list != Some(token.seq) {
            debug!(seq = token.seq, latest = ?self.latest_list, "Dropping stale version list");
            return false;
        }
        self.latest_list = None;

        match result {
            Ok(ListResponse::Versions(entries)) => {
                self.availability = Availability::Available;
                self.state.versions = VersionList::from_entries(entries);
                debug!(count = self.state.versions.len(), "Version list updated");

                if let Some(sha) = self.state.active_sha().cloned() {
                    if !self.state.versions.contains(&sha) {
                        info!(sha = %sha.short(), "Previewed version left the history");
                        self.state.mode = NavMode::Editing;
                    }
                }
            }
            Ok(ListResponse::Unavailable) => self.mark_unavailable(),
            Err(err) => self.record_failure(RequestKind::List, err),
        }
        true
    }

    fn finish_mutation(&mut self, token: &RequestToken) -> bool {
        let before = self.mutations.len();
        self.mutations.retain(|t| t.seq != token.seq);
        before != self.mutations.len()
    }

    /// Apply a rollback completion.
    ///
    /// Success returns to live editing, even if the user moved on while the
    /// request was in flight, and refreshes the list. Failure leaves the
    /// mode untouched.
    pub fn on_rolled_back(&mut self, token: &RequestToken, result: ClientResult<()>) -> bool {
        if !self.finish_mutation(token) || self.is_foreign(token) {
            return false;
        }
        match result {
            Ok(()) => {
                info!(sha = ?token.sha, "Rollback complete");
                self.state.mode = NavMode::Editing;
                self.refresh();
            }
            Err(err) => self.record_failure(RequestKind::Rollback, err),
        }
        true
    }

    /// Apply a delete completion.
    pub fn on_deleted(&mut self, token: &RequestToken, result: ClientResult<()>) -> bool {
        if !self.finish_mutation(token) || self.is_foreign(token) {
            return false;
        }
        match result {
            Ok(()) => {
                info!(sha = ?token.sha, "Delete complete");
                self.refresh();
            }
            Err(err) => self.record_failure(RequestKind::Delete, err),
        }
        true
    }

    /// Apply a create completion.
    pub fn on_created(&mut self, token: &RequestToken, result: ClientResult<CreateOutcome>) -> bool {
        if self.pending_create.as_ref().map(|t| t.seq) != Some(token.seq) || self.is_foreign(token)
        {
            return false;
        }
        self.pending_create = None;

        match result {
            Ok(CreateOutcome { sha: Some(sha), note }) => {
                info!(sha = %sha.short(), "Version saved");
                self.notice = note;
                self.refresh();
            }
            Ok(CreateOutcome { sha: None, note }) => {
                debug!("Nothing to save");
                self.notice = Some(note.unwrap_or_else(|| NO_CHANGES_NOTICE.to_string()));
            }
            Err(err) => self.record_failure(RequestKind::Create, err),
        }
        true
    }
}
