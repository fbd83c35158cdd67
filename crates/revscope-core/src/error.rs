//! Error types for the core crate.

use std::fmt;

use thiserror::Error;

use crate::client::ClientError;
use crate::request::RequestKind;
use crate::version::Sha;

/// Why a version is protected from rollback or deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardReason {
    /// The first version of the project.
    Initial,
    /// The most recent version of the project.
    Head,
}

impl fmt::Display for GuardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardReason::Initial => write!(f, "initial"),
            GuardReason::Head => write!(f, "latest"),
        }
    }
}

/// Errors surfaced by history navigation.
///
/// Every variant renders as text fit to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Version control is disabled for the project.
    #[error("Version history is not enabled for this project")]
    CollaboratorUnavailable,

    /// A backend call failed.
    #[error("Could not {operation}: {reason}")]
    RequestFailed {
        operation: RequestKind,
        reason: String,
    },

    /// Rollback or delete attempted on a protected version.
    #[error("Cannot {} the {reason} version ({sha})", .operation.action())]
    GuardViolation {
        operation: RequestKind,
        sha: Sha,
        reason: GuardReason,
    },

    /// The sha is not in the current version list.
    #[error("Version {0} is not in the history")]
    NotInHistory(Sha),

    /// A rollback or delete for this sha has not completed yet.
    #[error("Version {sha} is busy with a rollback or delete")]
    Busy { sha: Sha },

    /// The operation needs an active preview.
    #[error("No version is being previewed")]
    NotPreviewing,

    /// Only one create may be outstanding.
    #[error("A version is already being saved")]
    CreateInFlight,
}

impl HistoryError {
    /// Convert a backend error at the navigator/coordinator boundary.
    pub fn from_client(operation: RequestKind, err: ClientError) -> Self {
        match err {
            ClientError::Unavailable => HistoryError::CollaboratorUnavailable,
            ClientError::Failed { reason } => HistoryError::RequestFailed { operation, reason },
            ClientError::Transport(message) => HistoryError::RequestFailed {
                operation,
                reason: message,
            },
        }
    }

    /// Persistent conditions are shown as a banner instead of an inline,
    /// dismissable message.
    pub fn is_persistent(&self) -> bool {
        matches!(self, HistoryError::CollaboratorUnavailable)
    }
}

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// The config file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
