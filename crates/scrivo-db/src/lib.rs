//! # scrivo-db
//!
//! Storage layer for scrivo.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL implementations of the repository traits in `scrivo-core`
//! - Opaque bearer token issue and lookup
//! - An in-memory store with the same semantics, for tests and local runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use scrivo_db::{Database, NoteService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/scrivo").await?;
//!     db.migrate().await?;
//!
//!     let service = NoteService::new(db.stores());
//!     Ok(())
//! }
//! ```
pub mod history;
pub mod memory;
pub mod notes;
pub mod pool;
pub mod sharing;
pub mod tokens;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use std::sync::Arc;

use async_trait::async_trait;

// Re-export core types
pub use scrivo_core::*;

pub use history::PgHistoryRepository;
pub use memory::MemoryStore;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use sharing::PgShareRepository;
pub use tokens::{generate_token, hash_token, PgTokenRepository};
pub use users::PgUserRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Accounts.
    pub users: PgUserRepository,
    /// Note repository for CRUD operations and versioned updates.
    pub notes: PgNoteRepository,
    /// Share grants.
    pub shares: PgShareRepository,
    /// Note update history.
    pub history: PgHistoryRepository,
    /// Bearer tokens.
    pub tokens: PgTokenRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            shares: PgShareRepository::new(pool.clone()),
            history: PgHistoryRepository::new(pool.clone()),
            tokens: PgTokenRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Bundle the repositories as trait objects for [`NoteService`].
    pub fn stores(&self) -> Stores {
        Stores {
            users: Arc::new(self.users.clone()),
            notes: Arc::new(self.notes.clone()),
            shares: Arc::new(self.shares.clone()),
            history: Arc::new(self.history.clone()),
            tokens: Arc::new(self.tokens.clone()),
            health: Arc::new(self.clone()),
        }
    }
}

#[async_trait]
impl StoreHealth for Database {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        log_pool_metrics(&self.pool);
        Ok(())
    }
}
