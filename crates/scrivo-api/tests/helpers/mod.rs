//! Shared harness for the HTTP tests: a router over a fresh in-memory store,
//! driven with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use scrivo_api::{build_router, AppState, ServerConfig};
use scrivo_db::MemoryStore;

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// Config used by every test app: no rate limiting, defaults otherwise.
pub fn test_config() -> ServerConfig {
    ServerConfig::from_lookup(|key| match key {
        "RATE_LIMIT_ENABLED" => Some("false".to_string()),
        _ => None,
    })
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(store.stores(), &config);
        Self {
            router: build_router(state, &config),
            store,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Sign up and log in; returns `(user_id, token)`.
    pub async fn register(&self, username: &str) -> (i64, String) {
        let signup = self
            .post(
                "/signup/",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "s3cret-pass",
                }),
            )
            .await;
        assert_eq!(signup.status, StatusCode::CREATED, "{}", signup.body);

        let login = self
            .post(
                "/login/",
                None,
                json!({ "username": username, "password": "s3cret-pass" }),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);
        let id = login.body["user"]["id"].as_i64().unwrap();
        let token = login.body["token"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Create a note and return its id.
    pub async fn create_note(&self, token: &str, title: &str, content: &str) -> i64 {
        let res = self
            .post(
                "/notes/create/",
                Some(token),
                json!({ "title": title, "content": content }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.body["id"].as_i64().unwrap()
    }

    pub async fn share(&self, token: &str, note_id: i64, users: &[i64]) -> TestResponse {
        self.post(
            "/notes/share/",
            Some(token),
            json!({ "note_id": note_id, "users": users }),
        )
        .await
    }
}
