//! Version history navigation for revscope.
//!
//! This crate is the coordination layer between a versioning backend and a
//! text editor:
//! - Version lists with head/initial protection resolved once per fetch
//! - The [`VersionControl`] and [`Editor`] collaborator seams
//! - Request tokens and completion events for out-of-order async results
//! - [`VersionNavigator`]: the preview/rollback/delete state machine
//! - [`PreviewCoordinator`]: editor read-only flag and content during preview
//! - [`HistorySession`]: one project's navigator + coordinator + event loop
//! - Configuration loading

pub mod client;
pub mod config;
pub mod coordinator;
pub mod editor;
pub mod error;
pub mod event;
pub mod navigator;
pub mod request;
pub mod session;
pub mod version;

pub use client::{
    ClientError, ClientResult, CreateOutcome, DiffResponse, ListResponse, TreeResponse,
    VersionControl,
};
pub use config::HistoryConfig;
pub use coordinator::{PreviewCoordinator, PreviewView};
pub use editor::{ContentSource, Editor};
pub use error::{ConfigError, GuardReason, HistoryError, HistoryResult};
pub use event::HistoryEvent;
pub use navigator::{Availability, Direction, NavMode, NavigatorState, VersionNavigator};
pub use request::{Dispatcher, RequestCounter, RequestKind, RequestToken};
pub use session::HistorySession;
pub use version::{Sha, VersionEntry, VersionList, VersionRecord};
