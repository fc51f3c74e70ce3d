//! Router assembly: routes, shared state and the middleware stack.

use std::any::Any;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{delete, get, post, MethodRouter},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use scrivo_core::{NoteService, StoreHealth, Stores};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::handlers::{accounts, health, notes};
use crate::services::AccountService;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Global rate limiter type (direct quota, no per-client buckets).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
    pub accounts: AccountService,
    pub health: Arc<dyn StoreHealth>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(stores: Stores, config: &ServerConfig) -> Self {
        Self {
            notes: NoteService::new(stores.clone()),
            accounts: AccountService::new(stores.clone(), config.token_ttl()),
            health: stores.health,
            rate_limiter: build_rate_limiter(config).map(Arc::new),
        }
    }
}

/// Build the global limiter, or `None` when disabled or configured with zeros.
pub fn build_rate_limiter(config: &ServerConfig) -> Option<GlobalRateLimiter> {
    if !config.rate_limit_enabled {
        return None;
    }
    let burst = NonZeroU32::new(config.rate_limit_requests)?;
    let period = Duration::from_secs(config.rate_limit_period_secs) / burst.get();
    let quota = Quota::with_period(period)?.allow_burst(burst);
    Some(RateLimiter::direct(quota))
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router with its middleware stack.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", with_json_405(get(health::health_check)))
        .route("/signup/", with_json_405(post(accounts::signup)))
        .route("/login/", with_json_405(post(accounts::login)))
        .route("/notes/create/", with_json_405(post(notes::create_note)))
        .route("/notes/share/", with_json_405(post(notes::share_note)))
        .route(
            "/notes/:id/",
            with_json_405(get(notes::get_note).put(notes::update_note)),
        )
        .route(
            "/notes/version-history/:id/",
            with_json_405(get(notes::note_history)),
        )
        .route(
            "/notes/delete/:id/",
            with_json_405(delete(notes::delete_note)),
        )
        .fallback(route_not_found)
        // Middleware
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.cors_origins()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(axum::middleware::from_fn(body_limit_envelope))
        .with_state(state)
}

/// Answer unsupported methods on a known path with the JSON envelope.
fn with_json_405(router: MethodRouter<AppState>) -> MethodRouter<AppState> {
    router.fallback(method_not_allowed)
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Method not allowed." })),
    )
        .into_response()
}

/// The body limit layer answers oversized requests with a plain-text 413
/// before any handler runs; give those the JSON error envelope.
async fn body_limit_envelope(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return ApiError::PayloadTooLarge.into_response();
    }
    response
}

async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

fn make_request_span(request: &axum::http::Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
        user_id = tracing::field::Empty,
        note_id = tracing::field::Empty,
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("Handler panicked: {}", detail)).into_response()
}

// =============================================================================
// RATE LIMITING MIDDLEWARE
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // If rate limiting is disabled, pass through
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = "api", "Rate limit exceeded");
            return Err(ApiError::TooManyRequests);
        }
    }
    Ok(next.run(request).await)
}
