//! Completion events.

use crate::client::{ClientResult, CreateOutcome, DiffResponse, ListResponse, TreeResponse};
use crate::request::RequestToken;

/// The result of one backend call, tagged with the token it was issued under.
#[derive(Debug, Clone)]
pub enum HistoryEvent {
    Listed {
        token: RequestToken,
        result: ClientResult<ListResponse>,
    },
    Created {
        token: RequestToken,
        result: ClientResult<CreateOutcome>,
    },
    RolledBack {
        token: RequestToken,
        result: ClientResult<()>,
    },
    Deleted {
        token: RequestToken,
        result: ClientResult<()>,
    },
    DiffLoaded {
        token: RequestToken,
        result: ClientResult<DiffResponse>,
    },
    TreeLoaded {
        token: RequestToken,
        result: ClientResult<TreeResponse>,
    },
}

impl HistoryEvent {
    pub fn token(&self) -> &RequestToken {
        match self {
            HistoryEvent::Listed { token, .. }
            | HistoryEvent::Created { token, .. }
            | HistoryEvent::RolledBack { token, .. }
            | HistoryEvent::Deleted { token, .. }
            | HistoryEvent::DiffLoaded { token, .. }
            | HistoryEvent::TreeLoaded { token, .. } => token,
        }
    }
}
