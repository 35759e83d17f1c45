//! Mock backend tests for the session layer.
//!
//! These tests use wiremock to simulate the pass-management backend and
//! exercise login, token attachment, 401 invalidation and guarded navigation
//! without network access.

use std::sync::Arc;
use std::time::Duration;

use passgate_core::error::Error;
use passgate_core::{
    ApiUrl, AppProfile, AuthToken, Credential, KeyValueStorage, Loader, NavigationOutcome,
    Navigator, Resolution, RouteGuard,
};
use passgate_http::{LOGIN_FAILED, Session};
use passgate_store::{CredentialStore, FileStorage, MemoryStorage};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create an API URL from a mock server.
fn mock_api_url(server: &MockServer) -> ApiUrl {
    ApiUrl::new(server.uri()).unwrap()
}

/// An API URL on a local port nothing listens on.
fn closed_port_api_url() -> ApiUrl {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    ApiUrl::new(format!("http://127.0.0.1:{port}")).unwrap()
}

fn admin_store(storage: Arc<dyn KeyValueStorage>) -> CredentialStore {
    CredentialStore::new(storage, AppProfile::Admin.namespace())
}

fn stored_session(server: &MockServer, token: &str) -> (Arc<MemoryStorage>, Session) {
    let storage = Arc::new(MemoryStorage::new());
    let store = admin_store(storage.clone());
    store
        .save(&Credential::new(AuthToken::new(token), None))
        .unwrap();
    let session = Session::new(mock_api_url(server), store).unwrap();
    (storage, session)
}

async fn mount_login_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "right"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t1",
            "token_type": "bearer",
            "user": {"id": 1, "name": "Alice"}
        })))
        .mount(server)
        .await;
}

fn authorization_headers(requests: &[wiremock::Request]) -> Vec<Option<String>> {
    requests
        .iter()
        .map(|r| {
            r.headers
                .get("authorization")
                .map(|v| v.to_str().unwrap().to_string())
        })
        .collect()
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_wrong_password_records_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let session = Session::new(mock_api_url(&server), admin_store(storage.clone())).unwrap();

    assert!(!session.login("alice", "wrong").await);
    assert_eq!(session.last_error().as_deref(), Some("Invalid credentials"));
    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_login_success_persists_credential() {
    let server = MockServer::start().await;
    mount_login_success(&server).await;

    let storage = Arc::new(MemoryStorage::new());
    let session = Session::new(mock_api_url(&server), admin_store(storage.clone())).unwrap();

    assert!(session.login("alice", "right").await);
    assert!(session.is_authenticated());
    assert_eq!(session.last_error(), None);

    let principal = session.principal().unwrap();
    assert_eq!(principal.as_value(), &json!({"id": 1, "name": "Alice"}));

    assert_eq!(storage.get("admin.token").unwrap().as_deref(), Some("t1"));
    let user: Value = serde_json::from_str(&storage.get("admin.user").unwrap().unwrap()).unwrap();
    assert_eq!(user, json!({"id": 1, "name": "Alice"}));
}

#[tokio::test]
async fn test_login_without_detail_uses_generic_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();

    assert!(!session.login("alice", "right").await);
    assert_eq!(session.last_error().as_deref(), Some(LOGIN_FAILED));
}

#[tokio::test]
async fn test_login_inactive_user_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "User is inactive"})),
        )
        .mount(&server)
        .await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Guard,
    )
    .unwrap();

    assert!(!session.login("bob", "pw").await);
    assert_eq!(session.last_error().as_deref(), Some("User is inactive"));
}

#[tokio::test]
async fn test_login_unreachable_backend_does_not_raise() {
    let session = Session::open(
        closed_port_api_url(),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();

    assert!(!session.login("alice", "right").await);
    assert_eq!(session.last_error().as_deref(), Some(LOGIN_FAILED));
    assert!(!session.is_loading());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_login_with_empty_token_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "",
            "user": {"id": 1}
        })))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let session = Session::new(mock_api_url(&server), admin_store(storage.clone())).unwrap();

    assert!(!session.login("alice", "right").await);
    assert_eq!(session.last_error().as_deref(), Some(LOGIN_FAILED));
    assert!(!session.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_login_without_user_profile() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t2"
        })))
        .mount(&server)
        .await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Guard,
    )
    .unwrap();

    assert!(session.login("guard1", "pw").await);
    assert!(session.is_authenticated());
    assert!(session.principal().is_none());
}

#[tokio::test]
async fn test_failed_login_clears_previous_error_on_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "wrong"})))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;
    mount_login_success(&server).await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();

    assert!(!session.login("alice", "wrong").await);
    assert!(session.last_error().is_some());

    assert!(session.login("alice", "right").await);
    assert_eq!(session.last_error(), None);
}

#[tokio::test]
async fn test_login_loading_is_true_only_while_in_flight() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "t1", "user": null}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();
    assert!(!session.is_loading());

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.login("alice", "right").await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(session.is_loading());

    assert!(task.await.unwrap());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_login_loading_cleared_on_failure_and_cancellation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();

    let cancelled =
        tokio::time::timeout(Duration::from_millis(50), session.login("alice", "x")).await;
    assert!(cancelled.is_err());
    assert!(!session.is_loading());

    assert!(!session.login("alice", "x").await);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_overlapping_logins_keep_loading_until_the_last_finishes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "right"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "t1", "user": {"id": 1}}))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "wrong"})))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Invalid credentials"}))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();

    let slow = tokio::spawn({
        let session = session.clone();
        async move { session.login("alice", "right").await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!session.login("alice", "wrong").await);
    assert!(!slow.is_finished());
    assert!(session.is_loading());
    assert_eq!(session.last_error().as_deref(), Some("Invalid credentials"));

    assert!(slow.await.unwrap());
    assert!(!session.is_loading());
    assert!(session.is_authenticated());
    assert_eq!(session.last_error(), None);
}

#[tokio::test]
async fn test_superseded_login_failure_is_not_recorded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "wrong"})))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Invalid credentials"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_login_success(&server).await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();

    let stale = tokio::spawn({
        let session = session.clone();
        async move { session.login("alice", "wrong").await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(session.login("alice", "right").await);
    assert!(session.is_loading());

    assert!(!stale.await.unwrap());
    assert!(!session.is_loading());
    assert!(session.is_authenticated());
    assert_eq!(session.last_error(), None);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_login_survives_reinitialization() {
    let server = MockServer::start().await;
    mount_login_success(&server).await;

    let dir = TempDir::new().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(dir.path()));

    let first = Session::new(mock_api_url(&server), admin_store(storage.clone())).unwrap();
    assert!(first.login("alice", "right").await);
    let principal = first.principal();
    drop(first);

    let reopened = Session::new(
        mock_api_url(&server),
        admin_store(Arc::new(FileStorage::new(dir.path()))),
    )
    .unwrap();
    assert!(reopened.is_authenticated());
    assert_eq!(reopened.principal(), principal);
}

#[tokio::test]
async fn test_profiles_on_shared_storage_are_independent() {
    let server = MockServer::start().await;
    mount_login_success(&server).await;

    let dir = TempDir::new().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(dir.path()));

    let admin = Session::open(mock_api_url(&server), storage.clone(), AppProfile::Admin).unwrap();
    let guard = Session::open(mock_api_url(&server), storage.clone(), AppProfile::Guard).unwrap();

    assert!(admin.login("alice", "right").await);
    assert!(admin.is_authenticated());
    assert!(!guard.is_authenticated());

    let guard_reopened =
        Session::open(mock_api_url(&server), storage, AppProfile::Guard).unwrap();
    assert!(!guard_reopened.is_authenticated());
}

// ============================================================================
// Token attachment and invalidation
// ============================================================================

#[tokio::test]
async fn test_restored_token_is_attached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/statistics"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_passes": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let (_, session) = stored_session(&server, "t1");
    let stats: Value = session.client().get("/api/admin/statistics").await.unwrap();
    assert_eq!(stats["total_passes"], 3);
}

#[tokio::test]
async fn test_request_without_session_is_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/passes/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();
    let _: Value = session.client().get("/api/passes/").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(authorization_headers(&requests), vec![None]);
}

#[tokio::test]
async fn test_login_token_attached_to_next_request_and_logout_removes_it() {
    let server = MockServer::start().await;
    mount_login_success(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/passes/"))
        .and(query_param("skip", "0"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5}])))
        .mount(&server)
        .await;

    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();

    assert!(session.login("alice", "right").await);
    let passes: Value = session
        .client()
        .get_with_query("/api/passes/", &[("skip", 0), ("limit", 100)])
        .await
        .unwrap();
    assert_eq!(passes, json!([{"id": 5}]));

    session.logout();
    let _: Value = session
        .client()
        .get_with_query("/api/passes/", &[("skip", 0), ("limit", 100)])
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        authorization_headers(&requests),
        vec![None, Some("Bearer t1".to_string()), None]
    );
}

#[tokio::test]
async fn test_unauthorized_response_clears_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/statistics"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Could not validate credentials"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/visits/log"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (storage, session) = stored_session(&server, "t1");

    let result: Result<Value, Error> = session.client().get("/api/admin/statistics").await;
    let err = result.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.detail(), Some("Could not validate credentials"));

    assert!(!session.is_authenticated());
    assert!(storage.is_empty());

    let _: Value = session.client().get("/api/visits/log").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        authorization_headers(&requests),
        vec![Some("Bearer t1".to_string()), None]
    );
}

#[tokio::test]
async fn test_other_errors_pass_through_without_invalidation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/statistics"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "Insufficient permissions"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/passes/9"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": [
            {"loc": ["body", "valid_until"], "msg": "invalid datetime format", "type": "value_error"}
        ]})))
        .mount(&server)
        .await;

    let (_, session) = stored_session(&server, "t1");

    let err = session
        .client()
        .get::<Value>("/api/admin/statistics")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(ref p) if p.status == 403));
    assert_eq!(err.detail(), Some("Insufficient permissions"));

    let err = session
        .client()
        .put::<_, Value>("/api/passes/9", &json!({"valid_until": "soon"}))
        .await
        .unwrap_err();
    assert_eq!(err.detail(), Some("invalid datetime format"));

    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_transport_error_passes_through_unchanged() {
    let store = admin_store(Arc::new(MemoryStorage::new()));
    store
        .save(&Credential::new(AuthToken::new("t1"), None))
        .unwrap();
    let session = Session::new(closed_port_api_url(), store).unwrap();

    let err = session
        .client()
        .get::<Value>("/api/passes/")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_concurrent_requests_share_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(5)
        .mount(&server)
        .await;

    let (_, session) = stored_session(&server, "t1");

    let paths = [
        "/api/passes/1",
        "/api/passes/2",
        "/api/passes/3",
        "/api/visits/log",
        "/api/admin/statistics",
    ];
    let results =
        futures_util::future::join_all(paths.iter().map(|p| session.client().get::<Value>(p)))
            .await;

    assert!(results.iter().all(Result::is_ok));
}

#[tokio::test]
async fn test_invalidation_does_not_cancel_in_flight_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/passes/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "slow"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/admin/statistics"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (_, session) = stored_session(&server, "t1");

    let slow = tokio::spawn({
        let session = session.clone();
        async move { session.client().get::<Value>("/api/passes/slow").await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = session.client().get::<Value>("/api/admin/statistics").await;
    assert!(!session.is_authenticated());

    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow["id"], "slow");
}

// ============================================================================
// Guarded navigation
// ============================================================================

#[tokio::test]
async fn test_dashboard_without_token_redirects_to_login() {
    let server = MockServer::start().await;
    let session = Session::open(
        mock_api_url(&server),
        Arc::new(MemoryStorage::new()),
        AppProfile::Admin,
    )
    .unwrap();

    let profile = AppProfile::Admin;
    let mut routes = profile.routes();
    routes.push(passgate_core::Route::protected("/dashboard").unwrap());
    let mut nav = Navigator::new(RouteGuard::new(session, routes, profile.login_path()));

    let outcome = nav.navigate("/dashboard");
    assert_eq!(
        outcome,
        NavigationOutcome::Redirected {
            requested: "/dashboard".to_string(),
            to: "/login".to_string(),
        }
    );
    assert_ne!(nav.current(), Some("/dashboard"));
}

#[tokio::test]
async fn test_unauthorized_response_makes_guard_redirect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/passes/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (_, session) = stored_session(&server, "expired");
    let profile = AppProfile::Admin;
    let guard = RouteGuard::new(session.clone(), profile.routes(), profile.login_path());

    let intent = guard.intent("/passes");
    assert_eq!(guard.check(&intent), Resolution::Proceed);

    let _ = session.client().get::<Value>("/api/passes/").await;

    assert_eq!(
        guard.check(&intent),
        Resolution::Redirect("/login".to_string())
    );
    assert_eq!(
        guard.check(&guard.intent("/login")),
        Resolution::Proceed
    );
}

// ============================================================================
// Loader around authorized requests
// ============================================================================

#[tokio::test]
async fn test_loader_records_and_reraises_request_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/passes/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Pass not found"})))
        .mount(&server)
        .await;

    let (_, session) = stored_session(&server, "t1");
    let loader = Loader::new();

    let result = loader
        .execute(|| session.client().get::<Value>("/api/passes/404"))
        .await;

    assert!(matches!(result, Err(Error::Protocol(ref p)) if p.status == 404));
    assert_eq!(loader.error().as_deref(), Some("Pass not found"));
    assert!(!loader.is_loading());
}
