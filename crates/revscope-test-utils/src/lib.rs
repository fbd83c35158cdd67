//! Testing utilities, fixtures, and mocks for revscope.
//!
//! - **Mocks**: an in-memory versioning backend and a recording editor
//! - **Fixtures**: version lists and sample diffs
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use revscope_core::{HistoryConfig, HistorySession};
//! use revscope_test_utils::{fixtures, MockVersionControl, RecordingEditor};
//!
//! #[tokio::test]
//! async fn test_preview() {
//!     let backend = MockVersionControl::new().with_versions(fixtures::versions(&["v0", "v1", "v2"]));
//!     let editor = RecordingEditor::new();
//!     let mut session = HistorySession::new(
//!         "proj",
//!         Arc::new(backend.clone()),
//!         Box::new(editor.clone()),
//!         &HistoryConfig::default(),
//!     );
//!     session.settle().await;
//!     session.start_preview(&"v1".into()).unwrap();
//!     assert!(editor.is_read_only());
//! }
//! ```

pub mod fixtures;
pub mod mocks;

pub use mocks::{EditorCall, MockCall, MockVersionControl, RecordingEditor};
