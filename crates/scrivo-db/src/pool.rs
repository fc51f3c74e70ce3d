//! PostgreSQL connection pool setup.
//!
//! Environment variables read by [`PoolConfig::from_env`]:
//!   DB_MAX_CONNECTIONS       - upper bound on open connections (default 10)
//!   DB_MIN_CONNECTIONS       - connections kept warm (default 1)
//!   DB_ACQUIRE_TIMEOUT_SECS  - wait for a free connection (default 30)
//!   DB_IDLE_TIMEOUT_SECS     - close idle connections after (default 600)
//!   DB_MAX_LIFETIME_SECS     - recycle connections after, 0 disables (default 1800)

use std::time::{Duration, Instant};

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use scrivo_core::{Error, Result};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// Pool sizing and timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    /// `None` keeps connections until they fail or go idle.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl PoolConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to
    /// the defaults, and `min_connections` never exceeds `max_connections`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let num = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let max_connections =
            (num("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS as u64) as u32).max(1);
        let min_connections =
            (num("DB_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS as u64) as u32).min(max_connections);
        let max_lifetime = match num("DB_MAX_LIFETIME_SECS", DEFAULT_MAX_LIFETIME_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            max_connections,
            min_connections,
            acquire_timeout: Duration::from_secs(num(
                "DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )),
            idle_timeout: Duration::from_secs(num("DB_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS)),
            max_lifetime,
        }
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
    }
}

/// Connect with [`PoolConfig::default`].
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Connect with explicit pool settings.
///
/// The URL is parsed up front so a malformed `DATABASE_URL` is reported as a
/// configuration error rather than a connection failure. Only host and
/// database name are logged.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let connect_options: PgConnectOptions = database_url
        .parse()
        .map_err(|e| Error::Config(format!("Invalid DATABASE_URL: {}", e)))?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        host = connect_options.get_host(),
        database = connect_options.get_database().unwrap_or("-"),
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        "Opening database pool"
    );

    let pool = config
        .pool_options()
        .connect_with(connect_options)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        pool_size = pool.size(),
        pool_idle = pool.num_idle(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Log pool occupancy; warns when every connection is checked out.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();

    debug!(
        subsystem = "db",
        component = "pool",
        op = "metrics",
        pool_size = size,
        pool_idle = idle,
        "Pool occupancy"
    );

    if size > 0 && idle == 0 {
        warn!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            "All pooled connections in use"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.max_lifetime, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = PoolConfig::from_lookup(lookup(&[
            ("DB_MAX_CONNECTIONS", "25"),
            ("DB_MIN_CONNECTIONS", "4"),
            ("DB_ACQUIRE_TIMEOUT_SECS", " 5 "),
            ("DB_MAX_LIFETIME_SECS", "0"),
        ]));
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.min_connections, 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert!(config.max_lifetime.is_none());
    }

    #[test]
    fn test_from_lookup_clamps_and_ignores_garbage() {
        let config = PoolConfig::from_lookup(lookup(&[
            ("DB_MAX_CONNECTIONS", "0"),
            ("DB_MIN_CONNECTIONS", "8"),
            ("DB_IDLE_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.idle_timeout, Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS));
    }

    #[tokio::test]
    async fn test_malformed_url_is_config_error() {
        let err = create_pool("not a url").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
