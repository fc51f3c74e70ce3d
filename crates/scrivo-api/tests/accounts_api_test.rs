//! Signup, login and bearer token handling over HTTP.

mod helpers;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use helpers::TestApp;
use scrivo_api::ServerConfig;
use scrivo_db::TokenRepository;
use serde_json::json;

#[tokio::test]
async fn test_signup_returns_profile_without_password() {
    let app = TestApp::new();
    let res = app
        .post(
            "/signup/",
            None,
            json!({ "username": "alice", "email": "alice@example.com", "password": "pw" }),
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["message"], "User registration successful");
    assert_eq!(res.body["user"]["username"], "alice");
    assert_eq!(res.body["user"]["email"], "alice@example.com");
    assert!(res.body["user"].get("password").is_none());
    assert!(res.body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_without_email_is_allowed() {
    let app = TestApp::new();
    let res = app
        .post("/signup/", None, json!({ "username": "bob", "password": "pw" }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["user"]["email"], "");
}

#[tokio::test]
async fn test_signup_reports_field_errors() {
    let app = TestApp::new();
    let res = app
        .post("/signup/", None, json!({ "email": "not-an-email" }))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["fields"]["username"][0], "This field is required.");
    assert_eq!(res.body["fields"]["email"][0], "Enter a valid email address.");
    assert_eq!(res.body["fields"]["password"][0], "This field is required.");
}

#[tokio::test]
async fn test_signup_duplicate_username() {
    let app = TestApp::new();
    app.register("alice").await;

    let res = app
        .post("/signup/", None, json!({ "username": "alice", "password": "other" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body["fields"]["username"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let app = TestApp::new();
    let (id, token) = app.register("alice").await;

    assert!(token.starts_with("sn_at_"));
    let res = app
        .post(
            "/login/",
            None,
            json!({ "username": "alice", "password": "s3cret-pass" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["id"], id);
    assert!(res.body["expires_at"].is_string());
    assert_ne!(res.body["token"], token.as_str(), "each login issues a new token");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = TestApp::new();
    let res = app
        .post("/login/", None, json!({ "username": "alice" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Both username and password are required");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new();
    app.register("alice").await;

    for body in [
        json!({ "username": "alice", "password": "wrong" }),
        json!({ "username": "nobody", "password": "s3cret-pass" }),
    ] {
        let res = app.post("/login/", None, body).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["error"], "Invalid username or password");
    }
}

#[tokio::test]
async fn test_auth_routes_require_token() {
    let app = TestApp::new();
    let res = app
        .request(
            Method::POST,
            "/notes/create/",
            None,
            Some(json!({ "title": "t", "content": "c" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.get("/notes/1/", "sn_at_not-a-real-token").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new();
    let (id, _) = app.register("alice").await;
    let expired = app.store.issue(id, Duration::minutes(-5)).await.unwrap();

    let res = app.get("/notes/1/", &expired.token).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oversized_token_ttl_is_capped() {
    let app = TestApp::with_config(ServerConfig::from_lookup(|key| match key {
        "RATE_LIMIT_ENABLED" => Some("false".to_string()),
        "TOKEN_TTL_MINUTES" => Some("1000000000000".to_string()),
        _ => None,
    }));
    app.post(
        "/signup/",
        None,
        json!({ "username": "alice", "password": "s3cret-pass" }),
    )
    .await;

    let res = app
        .post(
            "/login/",
            None,
            json!({ "username": "alice", "password": "s3cret-pass" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let expires_at: chrono::DateTime<chrono::Utc> = res.body["expires_at"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(expires_at <= chrono::Utc::now() + Duration::days(366));
}

#[tokio::test]
async fn test_unknown_username_and_wrong_password_look_alike() {
    let app = TestApp::new();
    app.register("alice").await;

    let wrong_password = app
        .post("/login/", None, json!({ "username": "alice", "password": "nope" }))
        .await;
    let unknown_user = app
        .post("/login/", None, json!({ "username": "mallory", "password": "nope" }))
        .await;
    assert_eq!(wrong_password.status, unknown_user.status);
    assert_eq!(wrong_password.body, unknown_user.body);
}
