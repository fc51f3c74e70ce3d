//! HTTP error envelope.
//!
//! Every failure leaves the server as `{"error": "<message>"}`; validation
//! failures add `"fields": {"<field>": ["<message>", ...]}`. Server-side
//! faults are logged in full and answered with a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use scrivo_core::FieldErrors;

pub const NOT_FOUND_ROUTE: &str = "The requested URL was not found.";
pub const UNEXPECTED: &str = "An unexpected error occurred.";
pub const INVALID_DATA: &str = "Invalid request data.";
pub const NOTE_NOT_FOUND: &str = "Note not found";
pub const BODY_TOO_LARGE: &str = "Request body too large.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request data: {0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Request body too large.")]
    PayloadTooLarge,
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("Too many requests. Please wait before retrying.")]
    TooManyRequests,
    /// Detail is logged, never sent.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 404 for paths that match no route, or match one with an unusable id.
    pub fn route_not_found() -> Self {
        ApiError::NotFound(NOT_FOUND_ROUTE.to_string())
    }
}

impl From<scrivo_core::Error> for ApiError {
    fn from(err: scrivo_core::Error) -> Self {
        use scrivo_core::Error;
        match err {
            Error::Validation(fields) => ApiError::Validation(fields),
            Error::InvalidInput(msg) | Error::Conflict(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::NoteNotFound(_) => ApiError::NotFound(NOTE_NOT_FOUND.to_string()),
            err @ Error::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
            StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                ApiError::UnsupportedMediaType(rejection.body_text())
            }
            _ => ApiError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::route_not_found()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(fields) => json!({
                "error": INVALID_DATA,
                "fields": fields,
            }),
            ApiError::Internal(detail) => {
                tracing::error!(
                    subsystem = "api",
                    error = %detail,
                    "Request failed with internal error"
                );
                json!({ "error": UNEXPECTED })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
