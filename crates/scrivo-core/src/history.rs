//! Pre-update snapshots of notes.
//!
//! Stores call [`HistorySnapshot::capture`] on the note as it stands *before*
//! applying an update, inside the same transaction as the update, and persist
//! the snapshot as a [`NoteHistoryEntry`].

use chrono::{DateTime, Utc};

use crate::models::{Note, NoteHistoryEntry, NoteId};

/// A history record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub note: NoteId,
    pub timestamp: DateTime<Utc>,
    pub old_title: String,
    pub old_content: String,
}

impl HistorySnapshot {
    /// Snapshot the current title/content of `note`.
    pub fn capture(note: &Note, at: DateTime<Utc>) -> Self {
        Self {
            note: note.id,
            timestamp: at,
            old_title: note.title.clone(),
            old_content: note.content.clone(),
        }
    }

    /// Attach the id assigned by the store.
    pub fn into_entry(self, id: i64) -> NoteHistoryEntry {
        NoteHistoryEntry {
            id,
            note: self.note,
            timestamp: self.timestamp,
            old_title: self.old_title,
            old_content: self.old_content,
        }
    }
}
