//! In-memory implementation of every repository trait.
//!
//! Backs the service and HTTP tests, and `DATABASE_URL=memory` for local
//! runs. All state sits behind one async mutex so each trait call is atomic
//! with respect to the others, the same guarantee the Postgres transactions give.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use scrivo_core::{
    Error, HistoryRepository, HistorySnapshot, IssuedToken, NewUser, Note, NoteDraft,
    NoteHistoryEntry, NoteId, NoteRepository, Result, ShareRepository, SharedNote, StoreHealth,
    Stores, TokenRepository, User, UserId, UserRepository,
};

use crate::tokens::{expiry_after, generate_token, hash_token};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    notes: BTreeMap<NoteId, Note>,
    shares: Vec<SharedNote>,
    history: Vec<NoteHistoryEntry>,
    tokens: HashMap<String, (UserId, DateTime<Utc>)>,
    next_user: i64,
    next_note: i64,
    next_share: i64,
    next_history: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Process-local store for tests and development.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle this store as the full set of service repositories.
    pub fn stores(&self) -> Stores {
        let store = Arc::new(self.clone());
        Stores {
            users: store.clone(),
            notes: store.clone(),
            shares: store.clone(),
            history: store.clone(),
            tokens: store.clone(),
            health: store,
        }
    }

    /// Number of history entries across all notes.
    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }

    /// Number of share grants across all notes.
    pub async fn share_len(&self) -> usize {
        self.state.lock().await.shares.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(Error::Conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        let record = User {
            id: next(&mut state.next_user),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            date_joined: Utc::now(),
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn existing_ids(&self, ids: &[UserId]) -> Result<HashSet<UserId>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| state.users.contains_key(id))
            .collect())
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn insert(&self, owner: UserId, draft: &NoteDraft) -> Result<Note> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let note = Note {
            id: next(&mut state.next_note),
            owner,
            title: draft.title.clone(),
            content: draft.content.clone(),
            created_at: now,
            updated_at: now,
        };
        state.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn fetch(&self, id: NoteId) -> Result<Option<Note>> {
        Ok(self.state.lock().await.notes.get(&id).cloned())
    }

    async fn update_with_history(
        &self,
        id: NoteId,
        draft: &NoteDraft,
    ) -> Result<(Note, NoteHistoryEntry)> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let snapshot = match state.notes.get(&id) {
            Some(current) => HistorySnapshot::capture(current, now),
            None => return Err(Error::NoteNotFound(id)),
        };
        let entry = snapshot.into_entry(next(&mut state.next_history));
        state.history.push(entry.clone());

        let note = state
            .notes
            .get_mut(&id)
            .ok_or(Error::NoteNotFound(id))?;
        note.title = draft.title.clone();
        note.content = draft.content.clone();
        note.updated_at = now;
        Ok((note.clone(), entry))
    }

    async fn delete(&self, id: NoteId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.notes.remove(&id).is_none() {
            return Ok(false);
        }
        state.shares.retain(|s| s.note != id);
        state.history.retain(|h| h.note != id);
        Ok(true)
    }
}

#[async_trait]
impl ShareRepository for MemoryStore {
    async fn is_shared_with(&self, note: NoteId, user: UserId) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.shares.iter().any(|s| s.note == note && s.user == user))
    }

    async fn grant(&self, note: NoteId, users: &[UserId]) -> Result<u64> {
        let mut state = self.state.lock().await;
        if !state.notes.contains_key(&note) {
            return Err(Error::NoteNotFound(note));
        }
        if let Some(missing) = users.iter().find(|id| !state.users.contains_key(*id)) {
            return Err(Error::UserNotFound(*missing));
        }
        let mut granted = 0;
        for &user in users {
            if state.shares.iter().any(|s| s.note == note && s.user == user) {
                continue;
            }
            let id = next(&mut state.next_share);
            state.shares.push(SharedNote { id, note, user });
            granted += 1;
        }
        Ok(granted)
    }

    async fn list_for_note(&self, note: NoteId) -> Result<Vec<SharedNote>> {
        let state = self.state.lock().await;
        Ok(state
            .shares
            .iter()
            .filter(|s| s.note == note)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HistoryRepository for MemoryStore {
    async fn list_for_note(&self, note: NoteId) -> Result<Vec<NoteHistoryEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .history
            .iter()
            .filter(|h| h.note == note)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn issue(&self, user: UserId, ttl: Duration) -> Result<IssuedToken> {
        let expires_at = expiry_after(Utc::now(), ttl)?;
        let token = generate_token();
        self.state
            .lock()
            .await
            .tokens
            .insert(hash_token(&token), (user, expires_at));
        Ok(IssuedToken {
            token,
            user_id: user,
            expires_at,
        })
    }

    async fn resolve(&self, token: &str) -> Result<Option<UserId>> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .get(&hash_token(token))
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(user, _)| *user))
    }

    async fn purge_expired(&self) -> Result<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let before = state.tokens.len();
        state.tokens.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
