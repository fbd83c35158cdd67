//! Request tokens and the async dispatcher.
//!
//! Every backend call is tagged with a [`RequestToken`] when issued. The call
//! runs on its own tokio task and reports back with exactly one
//! [`HistoryEvent`]; whoever applies the event compares the token against
//! current state and drops it if it is stale.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::{ClientResult, VersionControl};
use crate::event::HistoryEvent;
use crate::version::Sha;

/// The backend operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    List,
    Create,
    Diff,
    Tree,
    Rollback,
    Delete,
}

impl RequestKind {
    /// Verb phrase used when an operation is refused for a specific version.
    pub fn action(&self) -> &'static str {
        match self {
            RequestKind::Rollback => "roll back to",
            RequestKind::Delete => "delete",
            RequestKind::List => "list",
            RequestKind::Create => "save",
            RequestKind::Diff => "diff",
            RequestKind::Tree => "list files of",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestKind::List => "load version history",
            RequestKind::Create => "save a version",
            RequestKind::Diff => "load changes",
            RequestKind::Tree => "load files",
            RequestKind::Rollback => "roll back",
            RequestKind::Delete => "delete the version",
        };
        f.write_str(s)
    }
}

/// Identifies one issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    /// Monotonically increasing per session.
    pub seq: u64,
    pub kind: RequestKind,
    /// The version the request targets, if any.
    pub sha: Option<Sha>,
    /// Project that was active when the request was issued.
    pub project_id: String,
}

impl RequestToken {
    /// Whether this token targets `sha`.
    pub fn targets(&self, sha: &Sha) -> bool {
        self.sha.as_ref() == Some(sha)
    }
}

/// Shared sequence counter.
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    next: Arc<AtomicU64>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sequence number, starting at 1.
    pub fn issue(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of sequence numbers issued so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

/// Spawns backend calls and routes their completions to the event channel.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn VersionControl>,
    tx: mpsc::UnboundedSender<HistoryEvent>,
    counter: RequestCounter,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn VersionControl>,
        tx: mpsc::UnboundedSender<HistoryEvent>,
        counter: RequestCounter,
    ) -> Self {
        Self {
            client,
            tx,
            counter,
        }
    }

    fn token(&self, kind: RequestKind, sha: Option<&Sha>, project_id: &str) -> RequestToken {
        RequestToken {
            seq: self.counter.issue(),
            kind,
            sha: sha.cloned(),
            project_id: project_id.to_string(),
        }
    }

    fn spawn<T, F>(
        &self,
        token: RequestToken,
        fut: F,
        wrap: fn(RequestToken, ClientResult<T>) -> HistoryEvent,
    ) -> RequestToken
    where
        T: Send + 'static,
        F: Future<Output = ClientResult<T>> + Send + 'static,
    {
        debug!(
            seq = token.seq,
            kind = ?token.kind,
            sha = ?token.sha,
            project = %token.project_id,
            "Issuing request"
        );
        let tx = self.tx.clone();
        let issued = token.clone();
        tokio::spawn(async move {
            let result = fut.await;
            if tx.send(wrap(token, result)).is_err() {
                warn!("History event receiver dropped before completion");
            }
        });
        issued
    }

    pub fn list(&self, project_id: &str) -> RequestToken {
        let token = self.token(RequestKind::List, None, project_id);
        let client = self.client.clone();
        let project = project_id.to_string();
        self.spawn(
            token,
            async move { client.list(&project).await },
            |token, result| HistoryEvent::Listed { token, result },
        )
    }

    pub fn create(&self, project_id: &str, label: Option<String>) -> RequestToken {
        let token = self.token(RequestKind::Create, None, project_id);
        let client = self.client.clone();
        let project = project_id.to_string();
        self.spawn(
            token,
            async move { client.create(&project, label.as_deref()).await },
            |token, result| HistoryEvent::Created { token, result },
        )
    }

    pub fn diff(&self, sha: &Sha, project_id: &str) -> RequestToken {
        let token = self.token(RequestKind::Diff, Some(sha), project_id);
        let client = self.client.clone();
        let (sha, project) = (sha.clone(), project_id.to_string());
        self.spawn(
            token,
            async move { client.diff(&sha, &project).await },
            |token, result| HistoryEvent::DiffLoaded { token, result },
        )
    }

    pub fn tree(&self, sha: &Sha, project_id: &str) -> RequestToken {
        let token = self.token(RequestKind::Tree, Some(sha), project_id);
        let client = self.client.clone();
        let (sha, project) = (sha.clone(), project_id.to_string());
        self.spawn(
            token,
            async move { client.tree(&sha, &project).await },
            |token, result| HistoryEvent::TreeLoaded { token, result },
        )
    }

    pub fn rollback(&self, sha: &Sha, project_id: &str) -> RequestToken {
        let token = self.token(RequestKind::Rollback, Some(sha), project_id);
        let client = self.client.clone();
        let (sha, project) = (sha.clone(), project_id.to_string());
        self.spawn(
            token,
            async move { client.rollback(&sha, &project).await },
            |token, result| HistoryEvent::RolledBack { token, result },
        )
    }

    pub fn delete(&self, sha: &Sha, project_id: &str) -> RequestToken {
        let token = self.token(RequestKind::Delete, Some(sha), project_id);
        let client = self.client.clone();
        let (sha, project) = (sha.clone(), project_id.to_string());
        self.spawn(
            token,
            async move { client.delete(&sha, &project).await },
            |token, result| HistoryEvent::Deleted { token, result },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_shared_and_monotonic() {
        let counter = RequestCounter::new();
        let clone = counter.clone();
        assert_eq!(counter.issue(), 1);
        assert_eq!(clone.issue(), 2);
        assert_eq!(counter.issued(), 2);
    }

    #[test]
    fn test_token_targets() {
        let token = RequestToken {
            seq: 1,
            kind: RequestKind::Diff,
            sha: Some(Sha::new("abc")),
            project_id: "p".into(),
        };
        assert!(token.targets(&Sha::new("abc")));
        assert!(!token.targets(&Sha::new("def")));
    }

    #[test]
    fn test_kind_wording() {
        assert_eq!(RequestKind::Tree.to_string(), "load files");
        assert_eq!(RequestKind::Rollback.action(), "roll back to");
    }
}
