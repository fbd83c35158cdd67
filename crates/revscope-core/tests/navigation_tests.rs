//! Navigation, rollback, delete and create driven through a session against
//! the in-memory backend.

use std::sync::Arc;

use revscope_core::{
    Availability, ClientError, Direction, GuardReason, HistoryConfig, HistoryError,
    HistorySession, NavMode, RequestKind, Sha,
};
use revscope_test_utils::{fixtures, EditorCall, MockVersionControl, RecordingEditor};

fn sha(s: &str) -> Sha {
    Sha::new(s)
}

async fn session_with(backend: &MockVersionControl) -> (HistorySession, RecordingEditor) {
    let editor = RecordingEditor::new();
    let mut session = HistorySession::new(
        "proj",
        Arc::new(backend.clone()),
        Box::new(editor.clone()),
        &HistoryConfig::default(),
    );
    session.settle().await;
    (session, editor)
}

fn three_versions() -> MockVersionControl {
    MockVersionControl::new().with_versions(fixtures::versions(&["v0", "v1", "v2"]))
}

#[tokio::test]
async fn test_history_walkthrough() {
    let backend = three_versions();
    let (mut session, _editor) = session_with(&backend).await;
    assert_eq!(session.state().versions.len(), 3);

    session.start_preview(&sha("v1")).unwrap();
    assert_eq!(session.state().mode, NavMode::Previewing(sha("v1")));

    assert!(session.navigate(Direction::Older).unwrap());
    assert_eq!(session.state().mode, NavMode::Previewing(sha("v2")));

    assert!(!session.navigate(Direction::Older).unwrap());
    assert_eq!(session.state().mode, NavMode::Previewing(sha("v2")));

    session.start_preview(&sha("v1")).unwrap();
    session.delete(&sha("v1")).unwrap();
    // The preview has already moved; the delete request has not run yet.
    assert_eq!(session.state().mode, NavMode::Previewing(sha("v2")));
    assert_eq!(backend.call_count(RequestKind::Delete), 0);

    session.settle().await;
    assert_eq!(backend.call_count(RequestKind::Delete), 1);
    assert_eq!(session.state().versions.len(), 2);
    assert!(!session.state().versions.contains(&sha("v1")));
    assert_eq!(session.state().mode, NavMode::Previewing(sha("v2")));
}

#[tokio::test]
async fn test_protected_versions_issue_no_calls() {
    let backend = three_versions();
    let (mut session, _editor) = session_with(&backend).await;

    session.start_preview(&sha("v0")).unwrap();
    let before = session.state().clone();
    assert_eq!(
        session.rollback(),
        Err(HistoryError::GuardViolation {
            operation: RequestKind::Rollback,
            sha: sha("v0"),
            reason: GuardReason::Head,
        })
    );
    assert!(matches!(
        session.delete(&sha("v0")),
        Err(HistoryError::GuardViolation { .. })
    ));

    session.start_preview(&sha("v2")).unwrap();
    assert!(session.rollback().is_err());
    assert!(session.delete(&sha("v2")).is_err());
    assert_eq!(session.state().versions, before.versions);
    assert_eq!(session.state().mode, NavMode::Previewing(sha("v2")));

    session.settle().await;
    assert_eq!(backend.call_count(RequestKind::Rollback), 0);
    assert_eq!(backend.call_count(RequestKind::Delete), 0);
    assert!(!session.can_rollback(&sha("v0")));
    assert!(!session.can_delete(&sha("v2")));
    assert!(session.can_delete(&sha("v1")));
}

#[tokio::test]
async fn test_rollback_success_returns_to_live_editing() {
    let backend = three_versions();
    let (mut session, editor) = session_with(&backend).await;

    session.start_preview(&sha("v1")).unwrap();
    session.rollback().unwrap();
    session.settle().await;

    assert_eq!(session.state().mode, NavMode::Editing);
    assert_eq!(backend.call_count(RequestKind::List), 2);
    assert!(!editor.is_read_only());
    assert!(editor.content().is_live());
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn test_rollback_failure_keeps_preview() {
    let backend = three_versions();
    let (mut session, editor) = session_with(&backend).await;
    backend.fail(RequestKind::Rollback, ClientError::failed("workspace locked"));

    session.start_preview(&sha("v1")).unwrap();
    session.rollback().unwrap();
    session.settle().await;

    assert_eq!(session.state().mode, NavMode::Previewing(sha("v1")));
    assert!(editor.is_read_only());
    assert_eq!(
        session.last_error().map(|e| e.to_string()),
        Some("Could not roll back: workspace locked".to_string())
    );

    session.dismiss_error();
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn test_delete_failure_leaves_moved_preview() {
    let backend = three_versions();
    let (mut session, _editor) = session_with(&backend).await;
    backend.fail(RequestKind::Delete, ClientError::Transport("timeout".into()));

    session.start_preview(&sha("v1")).unwrap();
    session.delete(&sha("v1")).unwrap();
    session.settle().await;

    assert_eq!(session.state().mode, NavMode::Previewing(sha("v2")));
    assert_eq!(session.state().versions.len(), 3);
    assert!(matches!(
        session.last_error(),
        Some(HistoryError::RequestFailed {
            operation: RequestKind::Delete,
            ..
        })
    ));
}

#[tokio::test]
async fn test_in_flight_mutation_makes_version_busy() {
    let backend = MockVersionControl::new().with_versions(fixtures::versions(&["v0", "v1", "v2", "v3"]));
    let (mut session, _editor) = session_with(&backend).await;
    backend.hold(RequestKind::Rollback, &sha("v1"));

    session.start_preview(&sha("v1")).unwrap();
    session.rollback().unwrap();

    assert_eq!(session.rollback(), Err(HistoryError::Busy { sha: sha("v1") }));
    assert_eq!(
        session.delete(&sha("v1")),
        Err(HistoryError::Busy { sha: sha("v1") })
    );
    assert_eq!(
        session.navigate(Direction::Newer),
        Err(HistoryError::Busy { sha: sha("v1") })
    );
    assert!(!session.can_rollback(&sha("v1")));

    backend.release(RequestKind::Rollback, Some(&sha("v1")));
    session.settle().await;
    assert_eq!(backend.call_count(RequestKind::Rollback), 1);
    assert_eq!(session.state().mode, NavMode::Editing);
    assert!(session.can_rollback(&sha("v1")));
}

#[tokio::test]
async fn test_create_without_changes_shows_notice() {
    let backend = three_versions();
    let (mut session, _editor) = session_with(&backend).await;

    session.create(None).unwrap();
    assert_eq!(session.create(None), Err(HistoryError::CreateInFlight));
    session.settle().await;

    assert_eq!(session.notice(), Some("No changes to save"));
    assert_eq!(backend.call_count(RequestKind::List), 1);
    assert_eq!(session.state().versions.len(), 3);
    session.dismiss_notice();
    assert!(session.notice().is_none());
}

#[tokio::test]
async fn test_create_failure_is_dismissable() {
    let backend = three_versions();
    let (mut session, _editor) = session_with(&backend).await;
    backend.mark_dirty();
    backend.fail(RequestKind::Create, ClientError::failed("disk full"));

    session.create(None).unwrap();
    session.settle().await;

    assert_eq!(
        session.last_error(),
        Some(&HistoryError::RequestFailed {
            operation: RequestKind::Create,
            reason: "disk full".into()
        })
    );
    assert!(session.notice().is_none());
    assert!(!session.navigator().has_pending());
    // No refresh after a failed create.
    assert_eq!(backend.call_count(RequestKind::List), 1);
    session.dismiss_error();
    assert!(session.last_error().is_none());

    backend.clear_failure(RequestKind::Create);
    session.create(None).unwrap();
    session.settle().await;
    assert_eq!(session.state().versions.len(), 4);
}

#[tokio::test]
async fn test_create_refreshes_list() {
    let backend = three_versions();
    let (mut session, _editor) = session_with(&backend).await;
    backend.mark_dirty();

    session.create(Some("checkpoint".into())).unwrap();
    session.settle().await;

    let versions = &session.state().versions;
    assert_eq!(versions.len(), 4);
    let head = versions.head().unwrap();
    assert_eq!(head.sha(), &sha("new1"));
    assert_eq!(head.entry.message, "checkpoint");
    assert!(!versions.find(&sha("v0")).unwrap().is_head);

    let calls = backend.calls_of(RequestKind::Create);
    assert_eq!(calls[0].label.as_deref(), Some("checkpoint"));
}

#[tokio::test]
async fn test_unavailable_backend_shows_banner() {
    let backend = three_versions().unavailable();
    let (mut session, _editor) = session_with(&backend).await;

    assert_eq!(session.navigator().availability(), Availability::Unavailable);
    assert_eq!(
        session.banner().as_deref(),
        Some("Version history is not enabled for this project")
    );
    assert!(session.state().versions.is_empty());
    assert!(session.last_error().is_none());

    assert_eq!(session.create(None), Err(HistoryError::CollaboratorUnavailable));
    assert!(matches!(
        session.start_preview(&sha("v1")),
        Err(HistoryError::NotInHistory(_))
    ));
    session.settle().await;
    assert_eq!(backend.call_count(RequestKind::Create), 0);
}

#[tokio::test]
async fn test_list_failure_is_dismissable() {
    let backend = three_versions();
    backend.fail(RequestKind::List, ClientError::failed("offline"));
    let (mut session, _editor) = session_with(&backend).await;

    assert_eq!(
        session.last_error(),
        Some(&HistoryError::RequestFailed {
            operation: RequestKind::List,
            reason: "offline".into()
        })
    );
    assert_eq!(session.navigator().availability(), Availability::Unknown);
    assert!(session.banner().is_none());

    backend.clear_failure(RequestKind::List);
    session.load();
    session.settle().await;
    assert_eq!(session.state().versions.len(), 3);
}

#[tokio::test]
async fn test_switch_project_resets_state() {
    let backend = three_versions().with_diff("v1", fixtures::SAMPLE_DIFF, fixtures::sample_stats());
    let (mut session, editor) = session_with(&backend).await;
    backend.hold(RequestKind::Diff, &sha("v1"));

    session.start_preview(&sha("v1")).unwrap();
    session.switch_project("other");

    assert_eq!(session.project_id(), "other");
    assert_eq!(session.state().mode, NavMode::Editing);
    assert!(session.state().versions.is_empty());
    assert_eq!(session.navigator().availability(), Availability::Unknown);
    assert!(!editor.is_read_only());

    editor.take_calls();
    backend.release(RequestKind::Diff, Some(&sha("v1")));
    session.settle().await;

    // The old project's diff arrived after the switch and was dropped.
    assert!(editor.take_calls().is_empty());
    assert_eq!(session.state().versions.len(), 3);
    let lists = backend.calls_of(RequestKind::List);
    assert_eq!(lists.last().unwrap().project_id, "other");
}

#[tokio::test]
async fn test_session_without_initial_load() {
    let backend = three_versions();
    let config = HistoryConfig {
        refresh_on_load: Some(false),
        ..Default::default()
    };
    let editor = RecordingEditor::new();
    let mut session = HistorySession::new("proj", Arc::new(backend.clone()), Box::new(editor.clone()), &config);

    session.settle().await;
    assert_eq!(backend.call_count(RequestKind::List), 0);
    assert!(session.state().versions.is_empty());
    assert_eq!(editor.calls(), Vec::<EditorCall>::new());
}
