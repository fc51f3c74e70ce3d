//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/scrivo` (`memory` for the in-memory store) |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `TOKEN_TTL_MINUTES` | `60`, clamped to 1..=[`MAX_TOKEN_TTL_MINUTES`] |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` |
//! | `RATE_LIMIT_ENABLED` | `true` |
//! | `RATE_LIMIT_REQUESTS` | `100` |
//! | `RATE_LIMIT_PERIOD_SECS` | `60` |
//! | `MAX_BODY_BYTES` | `1048576` |
//!
//! Unparseable numbers fall back to the default rather than failing startup.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use scrivo_core::{Error, Result};

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/scrivo";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Longest token lifetime accepted from `TOKEN_TTL_MINUTES` (one year).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// `DATABASE_URL` value that selects the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub token_ttl_minutes: i64,
    pub allowed_origins: String,
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_period_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
            raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
        }

        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(lookup("PORT"), 3000),
            token_ttl_minutes: parsed::<i64>(lookup("TOKEN_TTL_MINUTES"), 60)
                .clamp(1, MAX_TOKEN_TTL_MINUTES),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            rate_limit_enabled: lookup("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            rate_limit_requests: parsed(lookup("RATE_LIMIT_REQUESTS"), 100),
            rate_limit_period_secs: parsed(lookup("RATE_LIMIT_PERIOD_SECS"), 60),
            max_body_bytes: parsed(lookup("MAX_BODY_BYTES"), 1024 * 1024),
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid HOST/PORT: {}", e)))
    }

    /// CORS whitelist parsed from `ALLOWED_ORIGINS`.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        parse_allowed_origins(&self.allowed_origins)
    }
}

/// Parse a comma-separated origin list, skipping entries that are not valid
/// header values. An empty list falls back to [`DEFAULT_ALLOWED_ORIGINS`].
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    if origins.trim().is_empty() {
        return vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGINS)];
    }

    origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}
