#![allow(clippy::unwrap_used)]
// Session-level scenarios against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use boardstack_core::query::system_status;
use boardstack_core::{
    BOARDS, BoardCreateRequest, BoardUpdateRequest, ClientConfig, CoreError, CredentialStore,
    DEPLOYMENTS, DashboardUpdate, DeploymentStatus, MemoryCredentialStore, NotificationKind,
    Session, spawn_dashboard,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Session, Arc<MemoryCredentialStore>) {
    let server = MockServer::start().await;
    let credentials = Arc::new(MemoryCredentialStore::with_token("test-token"));
    let config = ClientConfig::new(format!("{}/api", server.uri()).parse().unwrap());
    let session = Session::new(config, credentials.clone()).unwrap();
    (server, session, credentials)
}

fn board_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "content": "body",
        "author": "alice",
        "createdAt": "2024-06-15T10:30:00",
        "updatedAt": "2024-06-15T10:30:00"
    })
}

fn status_json() -> serde_json::Value {
    json!({
        "system": {
            "status": "UP",
            "uptime": 1200,
            "services": { "openstack": "UP", "board": "UP" }
        },
        "boards": { "total": 2, "byStatus": {} },
        "deployments": { "total": 1, "byStatus": { "COMPLETED": 1 } }
    })
}

fn deployments_json() -> serde_json::Value {
    json!({
        "dep-1": {
            "deploymentId": "dep-1",
            "vmName": "web-01",
            "status": "COMPLETED",
            "statusMessage": "done",
            "createdAt": "2024-06-15T10:30:00"
        }
    })
}

fn new_board(title: &str) -> BoardCreateRequest {
    BoardCreateRequest {
        title: title.into(),
        content: "World".into(),
        author: "jo".into(),
        vm_request: None,
    }
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fresh_list_is_served_from_cache() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([board_json(1, "Hello")])))
        .expect(1)
        .mount(&server)
        .await;

    let first = session.boards().await.unwrap();
    let second = session.boards().await.unwrap();
    assert_eq!(first.len(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_concurrent_detail_reads_share_one_request() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/boards/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(board_json(7, "Seven"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (a, b) = tokio::join!(session.board(7), session.board(7));
    assert_eq!(a.unwrap().title, "Seven");
    assert_eq!(b.unwrap().title, "Seven");
}

#[tokio::test]
async fn test_search_is_cached_separately_from_list() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/boards/search"))
        .and(query_param("q", "vm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([board_json(3, "vm post")])))
        .expect(1)
        .mount(&server)
        .await;

    let found = session.search_boards("vm").await.unwrap();
    assert_eq!(found[0].id, 3);
    assert!(session.cache().state::<Vec<boardstack_core::Board>>(&BOARDS.lists()).is_none());
    assert!(
        session
            .cache()
            .state::<Vec<boardstack_core::Board>>(&BOARDS.list("q=vm"))
            .is_some()
    );
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_invalidates_lists_and_refetches() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([board_json(1, "Hello")])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            board_json(1, "Hello"),
            board_json(2, "Second")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(201).set_body_json(board_json(2, "Second")))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(session.boards().await.unwrap().len(), 1);

    let created = session.create_board(&new_board("Second")).await.unwrap();
    assert_eq!(created.id, 2);

    let list = session.boards().await.unwrap();
    assert_eq!(list.len(), 2);

    let notes = session.notifications().snapshot();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Success);
    assert_eq!(notes[0].message, "Post created (#2)");
}

#[tokio::test]
async fn test_failed_create_leaves_cache_untouched() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([board_json(1, "Hello")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
        .mount(&server)
        .await;

    session.boards().await.unwrap();
    let err = session.create_board(&new_board("Nope")).await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let state = session
        .cache()
        .state::<Vec<boardstack_core::Board>>(&BOARDS.lists())
        .unwrap();
    assert!(!state.is_stale);

    let notes = session.notifications().snapshot();
    assert_eq!(notes[0].kind, NotificationKind::Error);
    assert!(notes[0].message.starts_with("Failed to create post:"));
    assert!(notes[0].message.contains("db down"));
}

#[tokio::test]
async fn test_invalid_create_never_reaches_server() {
    let (server, session, _) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(201).set_body_json(board_json(9, "x")))
        .expect(0)
        .mount(&server)
        .await;

    let err = session.create_board(&new_board("  ")).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
    assert_eq!(session.notifications().len(), 1);
}

#[tokio::test]
async fn test_update_invalidates_list_and_detail() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([board_json(4, "Old")])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/boards/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_json(4, "New")))
        .mount(&server)
        .await;

    session.boards().await.unwrap();
    let update = BoardUpdateRequest {
        title: Some("New".into()),
        ..BoardUpdateRequest::default()
    };
    session.update_board(4, &update).await.unwrap();

    let state = session
        .cache()
        .state::<Vec<boardstack_core::Board>>(&BOARDS.lists())
        .unwrap();
    assert!(state.is_stale);
    // stale but still holding the previous list until refetched
    assert_eq!(state.value.unwrap()[0].title, "Old");
}

#[tokio::test]
async fn test_destroy_invalidates_deployments_and_status() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/openstack/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployments_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/integrated/system-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_json()))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/openstack/deployments/dep-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deploymentId": "dep-1",
            "vmName": "web-01",
            "status": "CANCELLED",
            "statusMessage": "destroyed",
            "createdAt": "2024-06-15T10:30:00"
        })))
        .mount(&server)
        .await;

    session.deployments().await.unwrap();
    session.system_status().await.unwrap();

    let destroyed = session.destroy_vm("dep-1").await.unwrap();
    assert_eq!(destroyed.status, DeploymentStatus::Cancelled);

    let deployments = session
        .cache()
        .state::<boardstack_core::DeploymentMap>(&DEPLOYMENTS.lists())
        .unwrap();
    assert!(deployments.is_stale);
    let status = session
        .cache()
        .state::<boardstack_core::SystemStatus>(&system_status())
        .unwrap();
    assert!(status.is_stale);
}

// ── Login boundary ──────────────────────────────────────────────────

#[tokio::test]
async fn test_401_clears_token_and_redirects_without_notification() {
    let (server, session, credentials) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/boards/1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = session.delete_board(1).await.unwrap_err();
    assert!(err.is_auth_expired());
    assert!(credentials.token().is_none());
    assert!(!session.is_authenticated());
    assert_eq!(session.last_redirect().unwrap().location, "/login");
    assert!(session.notifications().is_empty());
}

#[tokio::test]
async fn test_login_stores_token_and_logout_clears_cache() {
    let server = MockServer::start().await;
    let credentials = Arc::new(MemoryCredentialStore::new());
    let config = ClientConfig::new(format!("{}/api", server.uri()).parse().unwrap());
    let session = Session::new(config, credentials.clone()).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "jwt-abc",
            "refreshToken": "refresh",
            "expiresIn": 3600,
            "username": "alice",
            "roles": ["USER"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let auth = session
        .login("alice", &SecretString::from("pw".to_owned()))
        .await
        .unwrap();
    assert_eq!(auth.username, "alice");
    assert!(session.is_authenticated());

    session.boards().await.unwrap();
    assert_eq!(session.cache().len(), 1);

    session.logout().unwrap();
    assert!(credentials.token().is_none());
    assert!(session.cache().is_empty());
}

// ── Dashboard ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_dashboard_first_tick_is_immediate() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/openstack/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployments_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/integrated/system-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_json()))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_dashboard(
        session.clone(),
        Duration::from_secs(30),
        tx,
        CancellationToken::new(),
    );

    let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match update {
        DashboardUpdate::Refreshed { stats, status, .. } => {
            assert_eq!(stats.total, 1);
            assert_eq!(stats.count(DeploymentStatus::Completed), 1);
            assert_eq!(status.system.status, "UP");
        }
        DashboardUpdate::Failed { error, .. } => panic!("unexpected failure: {error}"),
    }

    handle.shutdown().await;
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_dashboard_reports_failures() {
    let (server, session, _) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/openstack/deployments"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/integrated/system-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_json()))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = spawn_dashboard(session, Duration::from_secs(30), tx, CancellationToken::new());

    let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        update,
        DashboardUpdate::Failed { ref error, .. } if error.status() == Some(503)
    ));
}

async fn deployment_hits(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/openstack/deployments")
        .count()
}

async fn mount_dashboard(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/openstack/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployments_json()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/integrated/system-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_json()))
        .mount(server)
        .await;
}

// Real time with a short period: the mock backend answers over sockets,
// which a paused clock would race against the request timeout.
#[tokio::test]
async fn test_dashboard_refetches_each_period_until_shutdown() {
    let (server, session, _) = setup().await;
    mount_dashboard(&server).await;

    let period = Duration::from_millis(300);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_dashboard(session.clone(), period, tx, CancellationToken::new());

    let wait = Duration::from_secs(5);
    let first = tokio::time::timeout(wait, rx.recv()).await.unwrap().unwrap();
    assert!(matches!(first, DashboardUpdate::Refreshed { .. }));
    assert_eq!(deployment_hits(&server).await, 1);

    // The deployment list is fresh for minutes, so a second request proves
    // the tick invalidated it.
    let second = tokio::time::timeout(wait, rx.recv()).await.unwrap().unwrap();
    assert!(matches!(second, DashboardUpdate::Refreshed { .. }));
    assert_eq!(deployment_hits(&server).await, 2);

    handle.shutdown().await;
    tokio::time::sleep(period * 3).await;
    assert_eq!(deployment_hits(&server).await, 2);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_dropping_dashboard_handle_stops_ticks() {
    let (server, session, _) = setup().await;
    mount_dashboard(&server).await;

    let period = Duration::from_millis(300);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_dashboard(session, period, tx, CancellationToken::new());

    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    drop(handle);

    // The task exits on cancellation and drops its sender.
    let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert!(closed.is_none());
    let hits = deployment_hits(&server).await;
    tokio::time::sleep(period * 3).await;
    assert_eq!(deployment_hits(&server).await, hits);
}
