//! Session store behaviour against a mock server.

use std::time::Duration;

use circle_core::api::ApiClient;
use circle_core::session::{Gate, SessionError, SessionState, SessionStore};
use circle_core::token_store::TokenStore;
use circle_core::types::RegisterRequest;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod fixtures;

use fixtures::{profile_json, user_json};

struct Harness {
    server: MockServer,
    dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn tokens(&self) -> TokenStore {
        TokenStore::new(self.dir.path().join("session.json"))
    }

    fn session(&self) -> SessionStore {
        let api = ApiClient::new(&format!("{}/api", self.server.uri()), None).unwrap();
        SessionStore::new(api, self.tokens())
    }
}

#[tokio::test]
async fn test_login_with_bad_credentials_stays_anonymous() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&h.server)
        .await;

    let session = h.session();
    assert_eq!(session.hydrate().await, SessionState::Anonymous);

    let err = session.login("ann", "wrong").await.unwrap_err();
    assert!(matches!(err, SessionError::Api(_)));
    assert_eq!(err.user_message(), "Invalid credentials");
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(session.api().token().is_none());
    assert!(h.tokens().load().unwrap().is_none());
}

#[tokio::test]
async fn test_login_persists_token_and_authenticates() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-1",
            "user": user_json(1, "ann"),
            "profile": profile_json(1, "ann"),
        })))
        .mount(&h.server)
        .await;

    let session = h.session();
    session.hydrate().await;
    let mut rx = session.subscribe();

    let user = session.login("ann", "pw").await.unwrap();
    assert_eq!(user.username, "ann");
    assert!(rx.has_changed().unwrap());
    assert!(matches!(rx.borrow_and_update().gate(), Gate::Allow(u) if u.id == 1));
    assert_eq!(session.api().token().as_deref(), Some("tok-1"));
    assert_eq!(h.tokens().load().unwrap().as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn test_startup_with_valid_token_restores_user() {
    let h = Harness::start().await;
    h.tokens().save("stored").unwrap();
    Mock::given(method("GET"))
        .and(path("/api/auth/user/"))
        .and(header("authorization", "Token stored"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json(4, "jane"),
            "profile": profile_json(4, "jane"),
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    assert_eq!(session.state(), SessionState::Uninitialized);
    let state = session.hydrate().await;
    assert_eq!(state.user().map(|u| u.username.as_str()), Some("jane"));
    assert_eq!(session.api().token().as_deref(), Some("stored"));
}

#[tokio::test]
async fn test_startup_with_rejected_token_removes_it() {
    let h = Harness::start().await;
    h.tokens().save("stale").unwrap();
    Mock::given(method("GET"))
        .and(path("/api/auth/user/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid token." })),
        )
        .mount(&h.server)
        .await;

    let session = h.session();
    assert_eq!(session.hydrate().await, SessionState::Anonymous);
    assert!(session.api().token().is_none());
    assert!(h.tokens().load().unwrap().is_none());
    assert!(!h.tokens().path().exists());
}

#[tokio::test]
async fn test_register_validates_then_authenticates() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "fresh",
            "user": user_json(9, "newbie"),
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    session.hydrate().await;

    let missing_password = RegisterRequest {
        username: "newbie".to_string(),
        email: "n@example.com".to_string(),
        ..RegisterRequest::default()
    };
    let err = session.register(&missing_password).await.unwrap_err();
    assert_eq!(err.user_message(), "password is required");
    assert_eq!(session.state(), SessionState::Anonymous);

    let request = RegisterRequest {
        password: "secret".to_string(),
        ..missing_password
    };
    let user = session.register(&request).await.unwrap();
    assert_eq!(user.id, 9);
    assert_eq!(h.tokens().load().unwrap().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_logout_makes_no_request() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok",
            "user": user_json(1, "ann"),
        })))
        .mount(&h.server)
        .await;

    let session = h.session();
    session.hydrate().await;
    session.login("ann", "pw").await.unwrap();
    let before = h.server.received_requests().await.unwrap().len();

    session.logout().unwrap();
    assert_eq!(session.state().gate(), Gate::RedirectToLogin);
    assert_eq!(h.server.received_requests().await.unwrap().len(), before);
    assert!(h.tokens().load().unwrap().is_none());
}

#[tokio::test]
async fn test_logout_during_hydration_wins() {
    let h = Harness::start().await;
    h.tokens().save("stored").unwrap();
    Mock::given(method("GET"))
        .and(path("/api/auth/user/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user_json(1, "ann") }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&h.server)
        .await;

    let session = h.session();
    let mut rx = session.subscribe();
    let hydrating = tokio::spawn({
        let session = session.clone();
        async move { session.hydrate().await }
    });
    rx.wait_for(|state| *state == SessionState::Loading)
        .await
        .unwrap();

    session.logout().unwrap();
    let settled = hydrating.await.unwrap();

    assert_eq!(settled, SessionState::Anonymous);
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(session.api().token().is_none());
    assert!(h.tokens().load().unwrap().is_none());
}

#[tokio::test]
async fn test_startup_with_server_error_discards_token() {
    let h = Harness::start().await;
    h.tokens().save("unchecked").unwrap();
    Mock::given(method("GET"))
        .and(path("/api/auth/user/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&h.server)
        .await;

    let session = h.session();
    assert_eq!(session.hydrate().await, SessionState::Anonymous);
    assert!(session.api().token().is_none());
    assert!(h.tokens().load().unwrap().is_none());
}
