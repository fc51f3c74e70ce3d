//! Note use-cases: create, read, update, share, history, delete.
//!
//! Every operation on an existing note follows the same order: load the note
//! (NotFound), resolve the caller's [`Access`] and authorize the action
//! (Forbidden / NotFound), then validate the payload (Validation), then
//! touch the store.

use std::time::Instant;

use tracing::{debug, info};

use crate::access::{Access, Action};
use crate::error::{Error, Result};
use crate::models::{Note, NoteHistoryEntry, NoteId, NoteInput, ShareInput, UserId};
use crate::traits::Stores;
use crate::validation::{validate_note, FieldErrors, REQUIRED};

/// Authorization and versioning over the note stores.
#[derive(Clone)]
pub struct NoteService {
    stores: Stores,
}

impl NoteService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn load(&self, id: NoteId) -> Result<Note> {
        self.stores
            .notes
            .fetch(id)
            .await?
            .ok_or(Error::NoteNotFound(id))
    }

    /// Resolve the access level of `actor` on `note`.
    ///
    /// The share registry is only consulted for non-owners.
    pub async fn access_for(&self, actor: UserId, note: &Note) -> Result<Access> {
        let is_shared = if note.owner == actor {
            false
        } else {
            self.stores.shares.is_shared_with(note.id, actor).await?
        };
        let access = Access::resolve(actor, note, is_shared);
        debug!(
            subsystem = "service",
            component = "access",
            note_id = note.id,
            user_id = actor,
            access = %access,
            "Resolved note access"
        );
        Ok(access)
    }

    /// Load a note and check that `actor` may perform `action` on it.
    async fn authorized(&self, actor: UserId, id: NoteId, action: Action) -> Result<Note> {
        let note = self.load(id).await?;
        let access = self.access_for(actor, &note).await?;
        access.authorize(action, id)?;
        Ok(note)
    }

    /// Create a note owned by `actor`.
    pub async fn create(&self, actor: UserId, input: &NoteInput) -> Result<Note> {
        let draft = validate_note(input)?;
        let note = self.stores.notes.insert(actor, &draft).await?;
        info!(
            subsystem = "service",
            component = "notes",
            op = "create",
            note_id = note.id,
            user_id = actor,
            "Note created"
        );
        Ok(note)
    }

    /// Fetch a note the actor owns or has been shared.
    pub async fn get(&self, actor: UserId, id: NoteId) -> Result<Note> {
        self.authorized(actor, id, Action::Read).await
    }

    /// Replace title and content, recording the previous values in history.
    pub async fn update(&self, actor: UserId, id: NoteId, input: &NoteInput) -> Result<Note> {
        let start = Instant::now();
        self.authorized(actor, id, Action::Write).await?;
        let draft = validate_note(input)?;
        let (note, entry) = self.stores.notes.update_with_history(id, &draft).await?;
        info!(
            subsystem = "service",
            component = "notes",
            op = "update",
            note_id = id,
            user_id = actor,
            history_id = entry.id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Note updated"
        );
        Ok(note)
    }

    /// Update history of a note, oldest first.
    pub async fn history(&self, actor: UserId, id: NoteId) -> Result<Vec<NoteHistoryEntry>> {
        self.authorized(actor, id, Action::ViewHistory).await?;
        let entries = self.stores.history.list_for_note(id).await?;
        debug!(
            subsystem = "service",
            component = "history",
            note_id = id,
            result_count = entries.len(),
            "Listed note history"
        );
        Ok(entries)
    }

    /// Share a note with a list of users.
    ///
    /// All-or-nothing: every user id is resolved before anything is written,
    /// and the first id (in request order) that does not exist is reported
    /// as `Error::UserNotFound` with no grant committed. Returns the number
    /// of new grants; re-sharing with an existing grantee is a no-op.
    pub async fn share(&self, actor: UserId, input: &ShareInput) -> Result<u64> {
        let mut errors = FieldErrors::new();
        if input.note_id.is_none() {
            errors.add("note_id", REQUIRED);
        }
        if input.users.is_none() {
            errors.add("users", REQUIRED);
        }
        let (Some(note_id), Some(users)) = (input.note_id, input.users.as_deref()) else {
            return Err(Error::Validation(errors));
        };

        self.authorized(actor, note_id, Action::Share).await?;

        let existing = self.stores.users.existing_ids(users).await?;
        if let Some(missing) = users.iter().find(|id| !existing.contains(*id)) {
            return Err(Error::UserNotFound(*missing));
        }

        let granted = self.stores.shares.grant(note_id, users).await?;
        info!(
            subsystem = "service",
            component = "sharing",
            op = "share",
            note_id,
            user_id = actor,
            requested = users.len(),
            granted,
            "Note shared"
        );
        Ok(granted)
    }

    /// Delete a note the actor owns; shares and history go with it.
    pub async fn delete(&self, actor: UserId, id: NoteId) -> Result<()> {
        self.authorized(actor, id, Action::Delete).await?;
        if !self.stores.notes.delete(id).await? {
            // Lost a race with a concurrent delete.
            return Err(Error::NoteNotFound(id));
        }
        info!(
            subsystem = "service",
            component = "notes",
            op = "delete",
            note_id = id,
            user_id = actor,
            "Note deleted"
        );
        Ok(())
    }
}
