//! Bearer token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use scrivo_core::{logging, User};

use crate::app::AppState;
use crate::error::ApiError;

pub const CREDENTIALS_MISSING: &str = "Authentication credentials were not provided.";
pub const TOKEN_INVALID: &str = "Given token not valid for any token type";

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// Records the resolved user id on the current request span.
///
/// ```ignore
/// async fn my_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     // ... handler logic
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub User);

/// Token part of a `Bearer` authorization header, if present.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized(CREDENTIALS_MISSING.to_string()))?;

        let user = state
            .accounts
            .authenticate(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(TOKEN_INVALID.to_string()))?;

        tracing::Span::current().record(logging::USER_ID, user.id);
        Ok(RequireAuth(user))
    }
}
