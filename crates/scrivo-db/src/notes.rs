//! Note repository implementation.
//!
//! Updates run in a single transaction that locks the note row, snapshots
//! its current title/content into `note_update_history`, then applies the
//! new values. Deletes rely on `ON DELETE CASCADE` for shares and history.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;

use scrivo_core::{
    Error, HistorySnapshot, Note, NoteDraft, NoteHistoryEntry, NoteId, NoteRepository, Result,
    UserId,
};

const NOTE_COLUMNS: &str = "id, owner_id, title, content, created_at, updated_at";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn note_from_row(r: &PgRow) -> Note {
        Note {
            id: r.get("id"),
            owner: r.get("owner_id"),
            title: r.get("title"),
            content: r.get("content"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }

    /// Fetch a note with a row lock, within an existing transaction.
    pub async fn fetch_for_update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: NoteId,
    ) -> Result<Option<Note>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note WHERE id = $1 FOR UPDATE",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::note_from_row))
    }

    /// Persist a history snapshot within an existing transaction.
    pub async fn insert_history_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        snapshot: HistorySnapshot,
    ) -> Result<NoteHistoryEntry> {
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO note_update_history (note_id, recorded_at, old_title, old_content)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(snapshot.note)
        .bind(snapshot.timestamp)
        .bind(&snapshot.old_title)
        .bind(&snapshot.old_content)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(snapshot.into_entry(id))
    }

    /// Update a note within an existing transaction, recording history first.
    pub async fn update_with_history_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: NoteId,
        draft: &NoteDraft,
    ) -> Result<(Note, NoteHistoryEntry)> {
        let current = self
            .fetch_for_update_tx(tx, id)
            .await?
            .ok_or(Error::NoteNotFound(id))?;

        let now = Utc::now();
        let entry = self
            .insert_history_tx(tx, HistorySnapshot::capture(&current, now))
            .await?;

        let row = sqlx::query(&format!(
            "UPDATE note SET title = $1, content = $2, updated_at = $3
             WHERE id = $4
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(now)
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok((Self::note_from_row(&row), entry))
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, owner: UserId, draft: &NoteDraft) -> Result<Note> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO note (owner_id, title, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(owner)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::note_from_row(&row))
    }

    async fn fetch(&self, id: NoteId) -> Result<Option<Note>> {
        let row = sqlx::query(&format!("SELECT {} FROM note WHERE id = $1", NOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::note_from_row))
    }

    async fn update_with_history(
        &self,
        id: NoteId,
        draft: &NoteDraft,
    ) -> Result<(Note, NoteHistoryEntry)> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.update_with_history_tx(&mut tx, id, draft).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(result)
    }

    async fn delete(&self, id: NoteId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            note_id = id,
            result_count = result.rows_affected(),
            "Deleted note (shares and history cascade)"
        );
        Ok(result.rows_affected() > 0)
    }
}
