//! One project's history session.
//!
//! [`HistorySession`] owns the navigator, the coordinator and the receiving
//! end of the event channel. Every user operation and every applied
//! completion re-synchronises the coordinator with the navigator, so the
//! editor always reflects the current mode.
//!
//! Sessions spawn tokio tasks and must be created inside a runtime.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::client::VersionControl;
use crate::config::HistoryConfig;
use crate::coordinator::{PreviewCoordinator, PreviewView};
use crate::editor::Editor;
use crate::error::{HistoryError, HistoryResult};
use crate::event::HistoryEvent;
use crate::navigator::{Availability, Direction, NavigatorState, VersionNavigator};
use crate::request::{Dispatcher, RequestCounter, RequestToken};
use crate::version::Sha;

pub struct HistorySession {
    navigator: VersionNavigator,
    coordinator: PreviewCoordinator,
    counter: RequestCounter,
    rx: mpsc::UnboundedReceiver<HistoryEvent>,
    /// Events received so far; every issued request yields exactly one.
    received: u64,
}

impl HistorySession {
    pub fn new(
        project_id: impl Into<String>,
        client: Arc<dyn VersionControl>,
        editor: Box<dyn Editor>,
        config: &HistoryConfig,
    ) -> Self {
        let project_id = project_id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let counter = RequestCounter::new();
        let dispatcher = Dispatcher::new(client, tx, counter.clone());

        let mut session = Self {
            navigator: VersionNavigator::new(project_id.clone(), dispatcher.clone()),
            coordinator: PreviewCoordinator::new(
                project_id,
                editor,
                dispatcher,
                config.tree_view(),
            ),
            counter,
            rx,
            received: 0,
        };
        if config.refresh_on_load() {
            session.load();
        }
        session
    }

    pub fn state(&self) -> &NavigatorState {
        self.navigator.state()
    }

    pub fn navigator(&self) -> &VersionNavigator {
        &self.navigator
    }

    pub fn coordinator(&self) -> &PreviewCoordinator {
        &self.coordinator
    }

    pub fn view(&self) -> Option<PreviewView> {
        self.coordinator.view()
    }

    pub fn project_id(&self) -> &str {
        self.navigator.project_id()
    }

    /// The dismissable error, preferring the navigator's.
    pub fn last_error(&self) -> Option<&HistoryError> {
        self.navigator
            .last_error()
            .or_else(|| self.coordinator.last_error())
    }

    pub fn dismiss_error(&mut self) {
        self.navigator.dismiss_error();
        self.coordinator.dismiss_error();
    }

    pub fn notice(&self) -> Option<&str> {
        self.navigator.notice()
    }

    pub fn dismiss_notice(&mut self) {
        self.navigator.dismiss_notice();
    }

    /// Persistent banner text while version control is unavailable.
    pub fn banner(&self) -> Option<String> {
        match self.navigator.availability() {
            Availability::Unavailable => Some(HistoryError::CollaboratorUnavailable.to_string()),
            _ => None,
        }
    }

    pub fn can_rollback(&self, sha: &Sha) -> bool {
        self.navigator.can_rollback(sha)
    }

    pub fn can_delete(&self, sha: &Sha) -> bool {
        self.navigator.can_delete(sha)
    }

    fn sync(&mut self) {
        self.coordinator.sync(self.navigator.state());
    }

    pub fn load(&mut self) -> RequestToken {
        self.navigator.load()
    }

    pub fn start_preview(&mut self, sha: &Sha) -> HistoryResult<()> {
        self.navigator.start_preview(sha)?;
        self.sync();
        Ok(())
    }

    pub fn navigate(&mut self, direction: Direction) -> HistoryResult<bool> {
        let moved = self.navigator.navigate(direction)?;
        self.sync();
        Ok(moved)
    }

    pub fn stop_preview(&mut self) -> bool {
        let stopped = self.navigator.stop_preview();
        self.sync();
        stopped
    }

    pub fn rollback(&mut self) -> HistoryResult<RequestToken> {
        self.navigator.rollback()
    }

    pub fn delete(&mut self, sha: &Sha) -> HistoryResult<RequestToken> {
        let token = self.navigator.delete(sha)?;
        self.sync();
        Ok(token)
    }

    pub fn create(&mut self, label: Option<String>) -> HistoryResult<RequestToken> {
        self.navigator.create(label)
    }

    pub fn set_tree_view(&mut self, on: bool) {
        self.coordinator.set_tree_view(on);
    }

    /// Drop all state of the current project and load `project_id`.
    pub fn switch_project(&mut self, project_id: impl Into<String>) -> RequestToken {
        let project_id = project_id.into();
        self.coordinator.reset(project_id.clone());
        self.navigator.reset(project_id);
        self.sync();
        self.navigator.load()
    }

    /// Apply one completion. Returns `false` if it was stale.
    pub fn handle_event(&mut self, event: HistoryEvent) -> bool {
        let applied = match event {
            HistoryEvent::Listed { token, result } => self.navigator.on_listed(&token, result),
            HistoryEvent::Created { token, result } => self.navigator.on_created(&token, result),
            HistoryEvent::RolledBack { token, result } => {
                self.navigator.on_rolled_back(&token, result)
            }
            HistoryEvent::Deleted { token, result } => self.navigator.on_deleted(&token, result),
            HistoryEvent::DiffLoaded { token, result } => self.coordinator.on_diff(&token, result),
            HistoryEvent::TreeLoaded { token, result } => self.coordinator.on_tree(&token, result),
        };
        if self.coordinator.take_lost_backend() {
            self.navigator.mark_unavailable();
        }
        self.sync();
        applied
    }

    /// Wait for the next completion without applying it.
    pub async fn next_event(&mut self) -> Option<HistoryEvent> {
        let event = self.rx.recv().await;
        if event.is_some() {
            self.received += 1;
        }
        event
    }

    /// Requests issued but not yet received.
    pub fn in_flight(&self) -> u64 {
        self.counter.issued().saturating_sub(self.received)
    }

    /// Receive and apply completions until nothing is in flight.
    ///
    /// Applying a completion may issue follow-up requests (a refresh after a
    /// rollback); those are awaited too.
    pub async fn settle(&mut self) {
        while self.in_flight() > 0 {
            let Some(event) = self.next_event().await else {
                break;
            };
            let token = event.token().clone();
            let applied = self.handle_event(event);
            debug!(seq = token.seq, kind = ?token.kind, applied, "Settled event");
        }
    }
}
