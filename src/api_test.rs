use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::json;

use super::*;

// =============================================================================
// Stub service
// =============================================================================

async fn stub_login(axum::Json(body): axum::Json<Value>) -> impl IntoResponse {
    if body["username"] == "alice" && body["password"] == "pw" {
        (StatusCode::OK, axum::Json(json!({ "token": "t1", "expiresIn": 3600 })))
    } else {
        (StatusCode::UNAUTHORIZED, axum::Json(json!({ "message": "bad credentials" })))
    }
}

async fn stub_register(axum::Json(body): axum::Json<Value>) -> impl IntoResponse {
    if body["username"] == "taken" {
        (StatusCode::CONFLICT, axum::Json(json!({ "message": "username already exists" })))
    } else {
        (StatusCode::CREATED, axum::Json(json!({ "id": 2 })))
    }
}

async fn stub_me(headers: HeaderMap) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth == "Bearer t1" {
        (
            StatusCode::OK,
            axum::Json(json!({ "user": { "id": 1, "username": "alice", "email": "a@example.test" } })),
        )
    } else {
        (StatusCode::FORBIDDEN, axum::Json(json!({ "message": "invalid token" })))
    }
}

fn stub_router() -> Router {
    Router::new()
        .route("/login", post(stub_login))
        .route("/register", post(stub_register))
        .route("/user/me", get(stub_me))
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client_for(router: Router) -> HttpAuthApi {
    let base = spawn(router).await;
    HttpAuthApi::new(&base, Timeouts::default()).unwrap()
}

fn creds(username: &str, password: &str) -> Credentials {
    Credentials { username: username.into(), password: password.into() }
}

// =============================================================================
// Helpers
// =============================================================================

#[test]
fn new_trims_trailing_slash() {
    let api = HttpAuthApi::new("http://localhost:3000/", Timeouts::default()).unwrap();
    assert_eq!(api.base_url(), "http://localhost:3000");
    assert_eq!(api.endpoint(ME_PATH), "http://localhost:3000/user/me");
}

#[test]
fn rejection_extracts_message() {
    let err = rejection(401, r#"{"message":"bad credentials"}"#);
    assert_eq!(err.server_message(), Some("bad credentials"));
    assert!(!err.is_transport());
}

#[test]
fn rejection_tolerates_non_json_body() {
    let err = rejection(502, "<html>Bad Gateway</html>");
    assert!(matches!(err, ApiError::Rejected { status: 502, message: None }));
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_returns_token() {
    let api = client_for(stub_router()).await;
    let grant = api.login(&creds("alice", "pw")).await.unwrap();
    assert_eq!(grant.token, Token::new("t1"));
}

#[tokio::test]
async fn login_rejected_carries_server_message() {
    let api = client_for(stub_router()).await;
    let err = api.login(&creds("alice", "wrong")).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 401, .. }));
    assert_eq!(err.server_message(), Some("bad credentials"));
}

#[tokio::test]
async fn login_success_without_token_is_malformed() {
    let router = Router::new().route("/login", post(|| async { axum::Json(json!({ "ok": true })) }));
    let api = client_for(router).await;
    let err = api.login(&creds("alice", "pw")).await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
}

#[tokio::test]
async fn login_unreachable_is_transport() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpAuthApi::new(&format!("http://{addr}"), Timeouts::default()).unwrap();
    let err = api.login(&creds("alice", "pw")).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.is_transport());
}

// =============================================================================
// register
// =============================================================================

#[tokio::test]
async fn register_success() {
    let api = client_for(stub_router()).await;
    let mut fields = Map::new();
    fields.insert("username".into(), json!("bob"));
    fields.insert("password".into(), json!("pw"));
    fields.insert("firstName".into(), json!("Bob"));
    api.register(&fields).await.unwrap();
}

#[tokio::test]
async fn register_conflict_carries_server_message() {
    let api = client_for(stub_router()).await;
    let mut fields = Map::new();
    fields.insert("username".into(), json!("taken"));
    let err = api.register(&fields).await.unwrap_err();
    assert_eq!(err.server_message(), Some("username already exists"));
}

#[tokio::test]
async fn register_success_ignores_non_json_body() {
    let router = Router::new().route("/register", post(|| async { "created" }));
    let api = client_for(router).await;
    api.register(&Map::new()).await.unwrap();
}

// =============================================================================
// current_user
// =============================================================================

#[tokio::test]
async fn current_user_sends_bearer_token() {
    let api = client_for(stub_router()).await;
    let user = api.current_user(&Token::new("t1")).await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.extra["email"], "a@example.test");
}

#[tokio::test]
async fn current_user_rejects_unknown_token() {
    let api = client_for(stub_router()).await;
    let err = api.current_user(&Token::new("stale")).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 403, .. }));
}

#[tokio::test]
async fn current_user_missing_user_field_is_malformed() {
    let router = Router::new().route("/user/me", get(|| async { axum::Json(json!({ "id": 1 })) }));
    let api = client_for(router).await;
    let err = api.current_user(&Token::new("t1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
}
