//! Repository traits implemented by the storage backends.
//!
//! These traits define the interfaces that concrete stores must satisfy.
//! The PostgreSQL implementation lives in `scrivo-db`; so does an in-memory
//! implementation used by tests and local development.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Identity and credential storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `Error::Conflict` if the username is taken.
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Fetch a user by id.
    async fn fetch(&self, id: UserId) -> Result<Option<User>>;

    /// Fetch a user by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Return the subset of `ids` that belong to existing users.
    async fn existing_ids(&self, ids: &[UserId]) -> Result<HashSet<UserId>>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Note persistence.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note owned by `owner`.
    async fn insert(&self, owner: UserId, draft: &NoteDraft) -> Result<Note>;

    /// Fetch a note by id.
    async fn fetch(&self, id: NoteId) -> Result<Option<Note>>;

    /// Apply `draft` to the note and record the pre-update title/content as a
    /// history entry, atomically.
    ///
    /// Returns `Error::NoteNotFound` if the note no longer exists.
    async fn update_with_history(
        &self,
        id: NoteId,
        draft: &NoteDraft,
    ) -> Result<(Note, NoteHistoryEntry)>;

    /// Delete a note together with its shares and history.
    ///
    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: NoteId) -> Result<bool>;
}

// =============================================================================
// SHARE REPOSITORY
// =============================================================================

/// Note → users access grants.
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Whether a grant links `note` and `user`.
    async fn is_shared_with(&self, note: NoteId, user: UserId) -> Result<bool>;

    /// Grant access on `note` to every user in `users`, atomically.
    ///
    /// Existing grants are left untouched. Returns the number of new grants.
    async fn grant(&self, note: NoteId, users: &[UserId]) -> Result<u64>;

    /// All grants on a note, oldest first.
    async fn list_for_note(&self, note: NoteId) -> Result<Vec<SharedNote>>;
}

// =============================================================================
// HISTORY REPOSITORY
// =============================================================================

/// Read side of the update history. Writes happen in
/// [`NoteRepository::update_with_history`].
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// History of a note, oldest first.
    async fn list_for_note(&self, note: NoteId) -> Result<Vec<NoteHistoryEntry>>;
}

// =============================================================================
// TOKEN REPOSITORY
// =============================================================================

/// Opaque bearer tokens issued at login.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Issue a new token for `user` valid for `ttl`.
    async fn issue(&self, user: UserId, ttl: Duration) -> Result<IssuedToken>;

    /// Resolve a presented token to its user, if valid and unexpired.
    async fn resolve(&self, token: &str) -> Result<Option<UserId>>;

    /// Delete expired tokens. Returns the number removed.
    async fn purge_expired(&self) -> Result<u64>;
}

// =============================================================================
// HEALTH
// =============================================================================

/// Reachability probe for the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<()>;
}

/// Every repository the service needs, as shared trait objects.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub shares: Arc<dyn ShareRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub health: Arc<dyn StoreHealth>,
}
