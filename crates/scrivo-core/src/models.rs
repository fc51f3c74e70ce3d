//! Data model shared by the stores, the service layer and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary key of a user row.
pub type UserId = i64;

/// Primary key of a note row.
pub type NoteId = i64;

// =============================================================================
// USERS
// =============================================================================

/// Full user record as stored. Never serialized: use [`UserProfile`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Client-safe projection without the password hash.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// A validated signup, with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// =============================================================================
// NOTES
// =============================================================================

/// A text note owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Owning user; fixed at creation.
    pub owner: UserId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw note fields as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }
}

/// Validated title/content pair, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

// =============================================================================
// SHARING
// =============================================================================

/// Grant of read/write access on a note to a user who does not own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedNote {
    pub id: i64,
    pub note: NoteId,
    pub user: UserId,
}

/// Raw share request as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareInput {
    pub note_id: Option<NoteId>,
    pub users: Option<Vec<UserId>>,
}

// =============================================================================
// HISTORY
// =============================================================================

/// Immutable snapshot of a note's title/content taken just before an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteHistoryEntry {
    pub id: i64,
    pub note: NoteId,
    pub timestamp: DateTime<Utc>,
    pub old_title: String,
    pub old_content: String,
}

// =============================================================================
// TOKENS
// =============================================================================

/// Bearer token handed to a client at login. The plaintext exists only here.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}
