//! Note access control.
//!
//! Every note has exactly one owner. Other users reach a note only through a
//! share grant, which allows reading and editing but never deleting or
//! re-sharing.
//!
//! | Action      | Owner | Shared | None      |
//! |-------------|-------|--------|-----------|
//! | Read        | ok    | ok     | Forbidden |
//! | Write       | ok    | ok     | Forbidden |
//! | ViewHistory | ok    | ok     | Forbidden |
//! | Delete      | ok    | Forbidden | NotFound |
//! | Share       | ok    | Forbidden | NotFound |
//!
//! Owner-only actions answer NotFound to users with no access at all, so a
//! stranger cannot probe which note ids exist through delete or share.

use std::fmt;

use crate::error::{Error, Result};
use crate::models::{Note, NoteId, UserId};

/// What a given user may do with a given note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The user created the note.
    Owner,
    /// The note was shared with the user.
    Shared,
    /// No relationship.
    None,
}

impl Access {
    /// Resolve the access level of `user` on `note`.
    ///
    /// `is_shared` is only consulted for non-owners.
    pub fn resolve(user: UserId, note: &Note, is_shared: bool) -> Self {
        if note.owner == user {
            Access::Owner
        } else if is_shared {
            Access::Shared
        } else {
            Access::None
        }
    }

    pub fn can_read(self) -> bool {
        matches!(self, Access::Owner | Access::Shared)
    }

    pub fn can_write(self) -> bool {
        self.can_read()
    }

    pub fn can_delete(self) -> bool {
        self == Access::Owner
    }

    pub fn can_share(self) -> bool {
        self == Access::Owner
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Access::Owner => "owner",
            Access::Shared => "shared",
            Access::None => "none",
        }
    }

    /// Check that this access level permits `action` on the note `note_id`.
    pub fn authorize(self, action: Action, note_id: NoteId) -> Result<()> {
        let allowed = match action {
            Action::Read | Action::ViewHistory => self.can_read(),
            Action::Write => self.can_write(),
            Action::Delete => self.can_delete(),
            Action::Share => self.can_share(),
        };
        if allowed {
            return Ok(());
        }
        if action.owner_only() && self == Access::None {
            return Err(Error::NoteNotFound(note_id));
        }
        Err(Error::Forbidden(action.denial().to_string()))
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations a user can attempt on an existing note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    ViewHistory,
    Delete,
    Share,
}

impl Action {
    fn owner_only(self) -> bool {
        matches!(self, Action::Delete | Action::Share)
    }

    /// Message returned to the client on refusal.
    pub fn denial(self) -> &'static str {
        match self {
            Action::Read => "Unauthorized to view this note",
            Action::Write => "Unauthorized to update this note",
            Action::ViewHistory => "Unauthorized to view version history of this note",
            Action::Delete => "Only the owner can delete this note",
            Action::Share => "Only the owner can share this note",
        }
    }
}
