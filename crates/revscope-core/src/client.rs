//! The versioning backend seam.
//!
//! Everything that stores or computes versions lives behind
//! [`VersionControl`]. Responses are explicit result types rather than loose
//! JSON so the navigator can match on them.

use async_trait::async_trait;
use revscope_diff::FileStat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::{Sha, VersionEntry};

/// Errors a backend can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Version control is not enabled for the project.
    #[error("version control is not enabled")]
    Unavailable,

    /// The backend refused or could not complete the request.
    #[error("{reason}")]
    Failed { reason: String },

    /// The request never got a proper answer.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ClientError::Failed {
            reason: reason.into(),
        }
    }
}

/// Result type for backend calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Answer to a list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "versions", rename_all = "lowercase")]
pub enum ListResponse {
    /// Versions, newest first.
    Versions(Vec<VersionEntry>),
    /// Version control is disabled for this project.
    Unavailable,
}

/// Answer to a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOutcome {
    /// `None` when there was nothing to save.
    pub sha: Option<Sha>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Raw diff of a version against its predecessor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResponse {
    pub diff: String,
    #[serde(default)]
    pub files: Vec<FileStat>,
}

/// Flat file listing of a version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeResponse {
    pub files: Vec<String>,
}

/// Operations the versioning backend exposes.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// List versions, newest first.
    async fn list(&self, project_id: &str) -> ClientResult<ListResponse>;

    /// Save the current workspace as a new version.
    async fn create(&self, project_id: &str, label: Option<&str>) -> ClientResult<CreateOutcome>;

    async fn diff(&self, sha: &Sha, project_id: &str) -> ClientResult<DiffResponse>;

    async fn tree(&self, sha: &Sha, project_id: &str) -> ClientResult<TreeResponse>;

    /// Replace the live workspace with `sha`.
    async fn rollback(&self, sha: &Sha, project_id: &str) -> ClientResult<()>;

    async fn delete(&self, sha: &Sha, project_id: &str) -> ClientResult<()>;
}
