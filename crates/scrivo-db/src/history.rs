//! Note update history repository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use scrivo_core::{Error, HistoryRepository, NoteHistoryEntry, NoteId, Result};

/// Repository for note update history.
#[derive(Clone)]
pub struct PgHistoryRepository {
    pool: PgPool,
}

impl PgHistoryRepository {
    /// Create a new history repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of history entries recorded for a note.
    pub async fn count_for_note(&self, note: NoteId) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM note_update_history WHERE note_id = $1")
            .bind(note)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn list_for_note(&self, note: NoteId) -> Result<Vec<NoteHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, note_id, recorded_at, old_title, old_content
            FROM note_update_history
            WHERE note_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(note)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|r| NoteHistoryEntry {
                id: r.get("id"),
                note: r.get("note_id"),
                timestamp: r.get("recorded_at"),
                old_title: r.get("old_title"),
                old_content: r.get("old_content"),
            })
            .collect())
    }
}
