//! Login, logout, and session gating through the binary.


use assert_cmd::cargo::cargo_bin_cmd;
use fixtures::{can_bind_localhost, read_session, temp_circle_home, user_json, write_session};
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

#[tokio::test]
async fn test_login_saves_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_circle_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({ "username": "jdoe", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-123456",
            "user": user_json(1, "jdoe", "John", "Doe"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .env("CIRCLE_API_URL", api_url(&server))
        .args(["login", "--username", "jdoe"])
        .write_stdin("hunter2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as John Doe (@jdoe)"));

    assert_eq!(read_session(home.path()).as_deref(), Some("tok-123456"));
}

#[tokio::test]
async fn test_login_failure_shows_server_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_circle_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .env("CIRCLE_API_URL", api_url(&server))
        .env("CIRCLE_PASSWORD", "wrong")
        .args(["login", "--username", "jdoe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Login failed: Invalid credentials"));

    assert!(!home.path().join("session.json").exists());
}

#[test]
fn test_protected_command_without_session() {
    let home = temp_circle_home();

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .env("CIRCLE_API_URL", "http://127.0.0.1:9/api")
        .arg("feed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in. Run `circle login`."));
}

#[tokio::test]
async fn test_rejected_token_is_removed() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_circle_home();
    write_session(home.path(), "stale-token");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/user/"))
        .and(header("authorization", "Token stale-token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid token." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .env("CIRCLE_API_URL", api_url(&server))
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));

    assert!(!home.path().join("session.json").exists());
}

#[tokio::test]
async fn test_whoami_with_valid_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_circle_home();
    write_session(home.path(), "good-token");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/user/"))
        .and(header("authorization", "Token good-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json(4, "jane", "Jane", "Roe"),
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .env("CIRCLE_API_URL", api_url(&server))
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Jane Roe (@jane)"))
        .stdout(predicate::str::contains("jane@example.com"));
}

#[test]
fn test_unverifiable_session_is_discarded() {
    let home = temp_circle_home();
    write_session(home.path(), "unchecked-token");

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .env("CIRCLE_API_URL", "http://127.0.0.1:9/api")
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));

    assert!(read_session(home.path()).is_none());
}

#[test]
fn test_logout_removes_session_without_network() {
    let home = temp_circle_home();
    write_session(home.path(), "abcdef123");

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .env("CIRCLE_API_URL", "http://127.0.0.1:9/api")
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"))
        .stdout(predicate::str::contains("abcdef123").not());

    assert!(!home.path().join("session.json").exists());
}

#[test]
fn test_logout_without_session() {
    let home = temp_circle_home();

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_logout_revoke_calls_server() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_circle_home();
    write_session(home.path(), "revoke-me");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .and(header("authorization", "Token revoke-me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("circle")
        .env("CIRCLE_HOME", home.path())
        .env("CIRCLE_API_URL", api_url(&server))
        .args(["logout", "--revoke"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Token revoked"));

    assert!(!home.path().join("session.json").exists());
}
