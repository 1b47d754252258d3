#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use boardstack_api::{
    ApiClient, BoardCreateRequest, BoardUpdateRequest, CredentialStore, DeployRequest,
    DeploymentStatus, Error, MemoryCredentialStore, RedirectSignal, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    client: ApiClient,
    credentials: Arc<MemoryCredentialStore>,
    redirect: Arc<RedirectSignal>,
}

async fn setup_with(token: Option<&str>, timeout: Duration) -> Harness {
    let server = MockServer::start().await;
    let credentials = Arc::new(match token {
        Some(t) => MemoryCredentialStore::with_token(t),
        None => MemoryCredentialStore::new(),
    });
    let redirect = Arc::new(RedirectSignal::new());
    let client = ApiClient::new(
        &format!("{}/api", server.uri()),
        &TransportConfig::default().with_timeout(timeout),
        credentials.clone(),
        redirect.clone(),
    )
    .unwrap();

    Harness {
        server,
        client,
        credentials,
        redirect,
    }
}

async fn setup() -> Harness {
    setup_with(Some("test-token"), Duration::from_secs(10)).await
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

fn deployment_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "deploymentId": id,
        "vmName": "web-01",
        "status": status,
        "statusMessage": "ok",
        "createdAt": "2024-06-15T10:30:00"
    })
}

// ── HTTP adapter ────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&h.server)
        .await;

    let boards = h.client.list_boards().await.unwrap();
    assert!(boards.is_empty());
}

#[tokio::test]
async fn test_no_token_sends_anonymous_request() {
    let h = setup_with(None, Duration::from_secs(10)).await;

    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;

    h.client.list_boards().await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_401_clears_credentials_and_redirects() {
    let h = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/boards/3"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let result = h.client.delete_board(3).await;

    assert!(matches!(result, Err(Error::AuthExpired)), "got {result:?}");
    assert!(h.credentials.token().is_none());
    let redirect = h.redirect.last().unwrap();
    assert_eq!(redirect.location, "/login");
    assert_eq!(redirect.sequence, 1);
}

#[tokio::test]
async fn test_401_uses_configured_login_path() {
    let server = MockServer::start().await;
    let redirect = Arc::new(RedirectSignal::new());
    let client = ApiClient::new(
        &server.uri(),
        &TransportConfig::default(),
        Arc::new(MemoryCredentialStore::with_token("t")),
        redirect.clone(),
    )
    .unwrap()
    .with_login_path("/auth/signin");

    Mock::given(method("GET"))
        .and(path("/integrated/system-status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(client.system_status().await.unwrap_err().is_auth_expired());
    assert_eq!(redirect.last().unwrap().location, "/auth/signin");
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let h = setup_with(Some("t"), Duration::from_millis(200)).await;

    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&h.server)
        .await;

    let result = h.client.list_boards().await;
    assert!(
        matches!(result, Err(Error::Timeout { .. })),
        "expected Timeout, got {result:?}"
    );
    // a timeout is not an auth failure
    assert!(h.credentials.token().is_some());
    assert!(h.redirect.last().is_none());
}

#[tokio::test]
async fn test_non_2xx_maps_to_http_error_with_message() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/boards/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "board not found" })),
        )
        .mount(&h.server)
        .await;

    let err = h.client.get_board(99).await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::Http { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "board not found");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body_is_kept() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&h.server)
        .await;

    let req = BoardCreateRequest {
        title: "T".into(),
        content: "C".into(),
        author: "A".into(),
        vm_request: None,
    };
    let err = h.client.create_board(&req).await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 500, ref message } if message == "boom"));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop a server so the port is very likely closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client = ApiClient::new(
        &uri,
        &TransportConfig::default(),
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(RedirectSignal::new()),
    )
    .unwrap();

    let result = client.list_boards().await;
    assert!(matches!(result, Err(Error::Network(_))), "got {result:?}");
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&h.server)
        .await;

    let result = h.client.list_boards().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Boards ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_board_sends_body() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/boards"))
        .and(body_json(json!({ "title": "T", "content": "C", "author": "A" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(board_json(1, "T")))
        .expect(1)
        .mount(&h.server)
        .await;

    let board = h
        .client
        .create_board(&BoardCreateRequest {
            title: "T".into(),
            content: "C".into(),
            author: "A".into(),
            vm_request: None,
        })
        .await
        .unwrap();

    assert_eq!(board.id, 1);
    assert_eq!(board.title, "T");
}

#[tokio::test]
async fn test_update_board_puts_partial_body() {
    let h = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/boards/5"))
        .and(body_json(json!({ "content": "edited" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_json(5, "Hello")))
        .expect(1)
        .mount(&h.server)
        .await;

    let board = h
        .client
        .update_board(
            5,
            &BoardUpdateRequest {
                content: Some("edited".into()),
                ..BoardUpdateRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(board.id, 5);
}

#[tokio::test]
async fn test_search_boards_passes_query() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/boards/search"))
        .and(query_param("q", "openstack"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([board_json(2, "OpenStack")])))
        .mount(&h.server)
        .await;

    let boards = h.client.search_boards("openstack").await.unwrap();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].title, "OpenStack");
}

#[tokio::test]
async fn test_delete_board_accepts_empty_body() {
    let h = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/boards/4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    h.client.delete_board(4).await.unwrap();
}

// ── OpenStack ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_deployments_returns_map() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/openstack/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dep-1": deployment_json("dep-1", "COMPLETED"),
            "dep-2": deployment_json("dep-2", "FAILED"),
        })))
        .mount(&h.server)
        .await;

    let map = h.client.list_deployments().await.unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["dep-1"].status, DeploymentStatus::Completed);
    assert_eq!(map["dep-2"].status, DeploymentStatus::Failed);
}

#[tokio::test]
async fn test_deploy_and_cancel() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/openstack/deploy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployment_json("dep-9", "PENDING")))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/openstack/deployments/dep-9/cancel"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(deployment_json("dep-9", "CANCELLED")),
        )
        .mount(&h.server)
        .await;

    let request = DeployRequest {
        vm_name: "web-01".into(),
        instance_type: "m1.small".into(),
        image_id: "ubuntu-22.04".into(),
        network_id: "net-1".into(),
        security_group: "default".into(),
        key_pair: "ops".into(),
        disk_size: 20,
        description: None,
        requested_by: "alice".into(),
    };

    let deployed = h.client.deploy_vm(&request).await.unwrap();
    assert_eq!(deployed.status, DeploymentStatus::Pending);

    let cancelled = h.client.cancel_deployment("dep-9").await.unwrap();
    assert_eq!(cancelled.status, DeploymentStatus::Cancelled);
}

#[tokio::test]
async fn test_destroy_vm_returns_deployment() {
    let h = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/openstack/deployments/dep-3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(deployment_json("dep-3", "IN_PROGRESS")),
        )
        .mount(&h.server)
        .await;

    let d = h.client.destroy_vm("dep-3").await.unwrap();
    assert_eq!(d.deployment_id, "dep-3");
}

// ── Integrated / auth ───────────────────────────────────────────────

#[tokio::test]
async fn test_system_status() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/integrated/system-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "system": {
                "status": "UP",
                "uptime": 12000,
                "services": { "openstack": "UP", "board": "UP" }
            },
            "boards": { "total": 3, "byStatus": { "active": 3 } },
            "deployments": { "total": 0, "byStatus": { "COMPLETED": 0 } }
        })))
        .mount(&h.server)
        .await;

    let status = h.client.system_status().await.unwrap();
    assert_eq!(status.system.status, "UP");
    assert_eq!(status.boards.total, 3);
    assert_eq!(status.boards.by_status["active"], 3);
}

#[tokio::test]
async fn test_login_stores_token() {
    let h = setup_with(None, Duration::from_secs(10)).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "admin", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "jwt-123",
            "refreshToken": "r-1",
            "expiresIn": 86_400_000,
            "username": "admin",
            "roles": ["ADMIN"]
        })))
        .mount(&h.server)
        .await;

    let session = h
        .client
        .login("admin", &SecretString::from("pw".to_string()))
        .await
        .unwrap();

    assert_eq!(session.username, "admin");
    assert_eq!(h.credentials.token().unwrap().expose_secret(), "jwt-123");

    h.client.logout().unwrap();
    assert!(h.credentials.token().is_none());
}
