//! Error envelope, routing edges and middleware behaviour.

mod helpers;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use helpers::{test_config, TestApp};
use scrivo_api::ServerConfig;
use serde_json::json;

#[tokio::test]
async fn test_unknown_route_uses_json_envelope() {
    let app = TestApp::new();
    let (_, token) = app.register("alice").await;

    let res = app.get("/nope/", &token).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, json!({ "error": "The requested URL was not found." }));
}

#[tokio::test]
async fn test_non_integer_note_id_is_not_found() {
    let app = TestApp::new();

    // Unauthenticated on purpose: routing is decided before credentials.
    let res = app
        .request(Method::GET, "/notes/abc/", None, None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "The requested URL was not found.");

    let (_, token) = app.register("alice").await;
    let res = app.delete("/notes/delete/abc/", &token).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    let app = TestApp::new();
    let (_, token) = app.register("alice").await;

    let res = app.get("/notes/create/", &token).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.body["error"], "Method not allowed.");

    let res = app.delete("/notes/1/", &token).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = TestApp::new();
    let (_, token) = app.register("alice").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/notes/create/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].is_string());
}

#[tokio::test]
async fn test_missing_credentials_message() {
    let app = TestApp::new();

    let res = app.request(Method::GET, "/notes/1/", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.body["error"],
        "Authentication credentials were not provided."
    );

    let res = app.get("/notes/1/", "garbage").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Given token not valid for any token type");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();

    let res = app.request(Method::GET, "/health", None, None).await;
    assert!(res.headers.contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "client-chosen-id")
        .body(Body::empty())
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.headers["x-request-id"], "client-chosen-id");
}

#[tokio::test]
async fn test_health_reports_store() {
    let app = TestApp::new();
    let res = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "healthy");
    assert_eq!(res.body["store"], "ok");
    assert!(res.body["version"].is_string());
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let app = TestApp::with_config(ServerConfig::from_lookup(|key| match key {
        "RATE_LIMIT_REQUESTS" => Some("1".to_string()),
        "RATE_LIMIT_PERIOD_SECS" => Some("3600".to_string()),
        _ => None,
    }));

    let first = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(second.body["error"].is_string());
}

#[tokio::test]
async fn test_cors_allows_configured_origin_only() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(
        res.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let res = app.send(request).await;
    assert!(!res.headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_oversized_body_is_rejected_as_json() {
    let mut config = test_config();
    config.max_body_bytes = 64;
    let app = TestApp::with_config(config);
    let body = json!({ "username": "u".repeat(512), "password": "pw" }).to_string();

    // Declared length over the limit: refused before the handler runs.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/signup/")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body.clone()))
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.body, json!({ "error": "Request body too large." }));

    // No declared length: the limit trips while the JSON body is buffered.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/signup/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.body, json!({ "error": "Request body too large." }));
}

#[tokio::test]
async fn test_missing_json_content_type_is_415() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/signup/")
        .body(Body::from(r#"{"username": "alice", "password": "pw"}"#))
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(res.body["error"].is_string());
}
