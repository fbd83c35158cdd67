//! Version list types.
//!
//! The backend returns versions newest first. [`VersionList::from_entries`]
//! resolves head and initial protection into explicit per-record flags once
//! per fetch, and every guard consults only those flags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GuardReason, HistoryError, HistoryResult};
use crate::request::RequestKind;

/// Opaque identifier of a saved version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(String);

impl Sha {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, for log lines and labels.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sha {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Sha {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A saved version as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub sha: Sha,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub message: String,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
    /// Saved explicitly by the user rather than automatically.
    #[serde(default)]
    pub is_user_version: bool,
    #[serde(default)]
    pub is_initial: bool,
}

impl VersionEntry {
    pub fn new(sha: impl Into<Sha>, message: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            author: String::new(),
            message: message.into(),
            timestamp: 0,
            is_user_version: false,
            is_initial: false,
        }
    }
}

/// An entry with its protection flags resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    pub entry: VersionEntry,
    pub is_head: bool,
    pub is_initial: bool,
}

impl VersionRecord {
    pub fn sha(&self) -> &Sha {
        &self.entry.sha
    }

    /// Why rollback and delete must be refused for this record, if they must.
    pub fn protection(&self) -> Option<GuardReason> {
        if self.is_initial {
            Some(GuardReason::Initial)
        } else if self.is_head {
            Some(GuardReason::Head)
        } else {
            None
        }
    }
}

/// The authoritative version list, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionList {
    records: Vec<VersionRecord>,
}

impl VersionList {
    /// Resolve head/initial flags for a freshly fetched list.
    ///
    /// Index 0 is the head. The last record is initial whether or not the
    /// backend flagged it; any other record keeps the backend's flag.
    pub fn from_entries(entries: Vec<VersionEntry>) -> Self {
        let last = entries.len().saturating_sub(1);
        let records = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| VersionRecord {
                is_head: idx == 0,
                is_initial: entry.is_initial || idx == last,
                entry,
            })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&VersionRecord> {
        self.records.get(idx)
    }

    pub fn index_of(&self, sha: &Sha) -> Option<usize> {
        self.records.iter().position(|r| r.sha() == sha)
    }

    pub fn find(&self, sha: &Sha) -> Option<&VersionRecord> {
        self.records.iter().find(|r| r.sha() == sha)
    }

    pub fn contains(&self, sha: &Sha) -> bool {
        self.index_of(sha).is_some()
    }

    pub fn head(&self) -> Option<&VersionRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionRecord> {
        self.records.iter()
    }

    /// The entry one step older than `sha`, if any.
    pub fn older(&self, sha: &Sha) -> Option<&VersionRecord> {
        self.index_of(sha).and_then(|idx| self.records.get(idx + 1))
    }

    /// The entry one step newer than `sha`, if any.
    pub fn newer(&self, sha: &Sha) -> Option<&VersionRecord> {
        self.index_of(sha)
            .and_then(|idx| idx.checked_sub(1))
            .and_then(|idx| self.records.get(idx))
    }

    /// Check that `operation` may target `sha`.
    pub fn guard(&self, sha: &Sha, operation: RequestKind) -> HistoryResult<&VersionRecord> {
        let record = self
            .find(sha)
            .ok_or_else(|| HistoryError::NotInHistory(sha.clone()))?;
        match record.protection() {
            Some(reason) => Err(HistoryError::GuardViolation {
                operation,
                sha: sha.clone(),
                reason,
            }),
            None => Ok(record),
        }
    }
}
