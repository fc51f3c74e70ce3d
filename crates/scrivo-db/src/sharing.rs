//! Share grant repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use scrivo_core::{Error, NoteId, Result, ShareRepository, SharedNote, UserId};

/// PostgreSQL implementation of ShareRepository.
#[derive(Clone)]
pub struct PgShareRepository {
    pool: Pool<Postgres>,
}

impl PgShareRepository {
    /// Create a new PgShareRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for PgShareRepository {
    async fn is_shared_with(&self, note: NoteId, user: UserId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM shared_note WHERE note_id = $1 AND user_id = $2)",
        )
        .bind(note)
        .bind(user)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn grant(&self, note: NoteId, users: &[UserId]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Hold the note for the duration so a concurrent delete cannot
        // strand the grants.
        let note_exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM note WHERE id = $1 FOR SHARE")
                .bind(note)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if note_exists.is_none() {
            return Err(Error::NoteNotFound(note));
        }
        if users.is_empty() {
            return Ok(0);
        }

        let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM app_user WHERE id = ANY($1)")
            .bind(users.to_vec())
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if let Some(missing) = users.iter().find(|id| !found.contains(*id)) {
            return Err(Error::UserNotFound(*missing));
        }

        let result = sqlx::query(
            r#"INSERT INTO shared_note (note_id, user_id, created_at)
               SELECT $1, u, $3 FROM UNNEST($2::bigint[]) AS u
               ON CONFLICT (note_id, user_id) DO NOTHING"#,
        )
        .bind(note)
        .bind(users.to_vec())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "sharing",
            op = "grant",
            note_id = note,
            requested = users.len(),
            result_count = result.rows_affected(),
            "Granted note access"
        );
        Ok(result.rows_affected())
    }

    async fn list_for_note(&self, note: NoteId) -> Result<Vec<SharedNote>> {
        let rows = sqlx::query(
            "SELECT id, note_id, user_id FROM shared_note WHERE note_id = $1 ORDER BY id",
        )
        .bind(note)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|r| SharedNote {
                id: r.get("id"),
                note: r.get("note_id"),
                user: r.get("user_id"),
            })
            .collect())
    }
}
