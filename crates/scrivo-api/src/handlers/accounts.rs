//! Signup and login handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Register a new user.
///
/// # Returns
/// - 201 Created with the public profile
/// - 400 Bad Request with field errors (missing fields, invalid email, taken username)
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let user = state
        .accounts
        .signup(
            req.username.as_deref(),
            req.email.as_deref(),
            req.password.as_deref(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registration successful",
            "user": user,
        })),
    ))
}

/// Exchange credentials for a bearer token.
///
/// # Returns
/// - 200 OK with `{token, expires_at, user}`
/// - 400 Bad Request if username or password is missing
/// - 401 Unauthorized on bad credentials
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let (token, user) = state
        .accounts
        .login(req.username.as_deref(), req.password.as_deref())
        .await?;
    Ok(Json(json!({
        "token": token.token,
        "expires_at": token.expires_at,
        "user": user,
    })))
}
