//! # scrivo-api
//!
//! HTTP surface of scrivo: an axum router over [`scrivo_core::NoteService`]
//! and the account services, with bearer token authentication, CORS, rate
//! limiting, request ids and tracing.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod services;

pub use app::{build_router, AppState};
pub use config::ServerConfig;
pub use error::ApiError;
