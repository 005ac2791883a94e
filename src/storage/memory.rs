//! In-memory note storage.
//!
//! [`NoteBook`] holds the whole data set and implements every store operation
//! synchronously. [`MemoryStore`] wraps it in a mutex; the JSON backend wraps
//! it too and adds persistence.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::NoteStore;
use crate::note_model::{NewUser, Note, NoteId, UserProfile};

/// Users and their notes, serializable as the JSON file layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteBook {
    next_note_id: i64,
    #[serde(default)]
    users: BTreeMap<i64, UserProfile>,
    #[serde(default)]
    notes: BTreeMap<i64, Vec<Note>>,
}

impl Default for NoteBook {
    fn default() -> Self {
        Self {
            next_note_id: 1,
            users: BTreeMap::new(),
            notes: BTreeMap::new(),
        }
    }
}

impl NoteBook {
    /// Insert the user if absent. Returns the stored profile and whether it was created.
    pub fn record_user(&mut self, user: &NewUser) -> (UserProfile, bool) {
        if let Some(existing) = self.users.get(&user.telegram_id) {
            return (existing.clone(), false);
        }
        let profile = UserProfile::register(user);
        self.users.insert(user.telegram_id, profile.clone());
        (profile, true)
    }

    pub fn get_user(&self, telegram_id: i64) -> Option<UserProfile> {
        self.users.get(&telegram_id).cloned()
    }

    pub fn list_users(&self) -> Vec<UserProfile> {
        let mut users: Vec<UserProfile> = self.users.values().cloned().collect();
        users.sort_by_key(|u| (u.first_seen, u.telegram_id));
        users
    }

    pub fn notes(&self, user_id: i64) -> &[Note] {
        self.notes.get(&user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn append_note(&mut self, user_id: i64, content: &str) -> Note {
        let note = Note {
            id: NoteId(self.next_note_id),
            user_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.next_note_id += 1;
        self.notes.entry(user_id).or_default().push(note.clone());
        note
    }

    pub fn update_note(&mut self, user_id: i64, note_id: NoteId, content: &str) -> bool {
        let position = self.position_of(user_id, note_id);
        match position {
            Some(index) => self.update_note_at(user_id, index, content),
            None => false,
        }
    }

    pub fn delete_note(&mut self, user_id: i64, note_id: NoteId) -> Option<Note> {
        let index = self.position_of(user_id, note_id)?;
        self.delete_note_at(user_id, index)
    }

    pub fn update_note_at(&mut self, user_id: i64, index: usize, content: &str) -> bool {
        match self.notes.get_mut(&user_id).and_then(|notes| notes.get_mut(index)) {
            Some(note) => {
                note.content = content.to_string();
                true
            }
            None => false,
        }
    }

    pub fn delete_note_at(&mut self, user_id: i64, index: usize) -> Option<Note> {
        let notes = self.notes.get_mut(&user_id)?;
        if index >= notes.len() {
            return None;
        }
        let removed = notes.remove(index);
        if notes.is_empty() {
            self.notes.remove(&user_id);
        }
        Some(removed)
    }

    fn position_of(&self, user_id: i64, note_id: NoteId) -> Option<usize> {
        self.notes(user_id).iter().position(|n| n.id == note_id)
    }
}

/// Note storage that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    book: Mutex<NoteBook>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn record_user(&self, user: &NewUser) -> Result<UserProfile> {
        let (profile, created) = self.book.lock().await.record_user(user);
        if created {
            debug!(user_id = user.telegram_id, "Registered new user");
        }
        Ok(profile)
    }

    async fn get_user(&self, telegram_id: i64) -> Result<Option<UserProfile>> {
        Ok(self.book.lock().await.get_user(telegram_id))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self.book.lock().await.list_users())
    }

    async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>> {
        Ok(self.book.lock().await.notes(user_id).to_vec())
    }

    async fn count_notes(&self, user_id: i64) -> Result<usize> {
        Ok(self.book.lock().await.notes(user_id).len())
    }

    async fn append_note(&self, user_id: i64, content: &str) -> Result<Note> {
        Ok(self.book.lock().await.append_note(user_id, content))
    }

    async fn update_note(&self, user_id: i64, note_id: NoteId, content: &str) -> Result<bool> {
        Ok(self.book.lock().await.update_note(user_id, note_id, content))
    }

    async fn delete_note(&self, user_id: i64, note_id: NoteId) -> Result<Option<Note>> {
        Ok(self.book.lock().await.delete_note(user_id, note_id))
    }

    async fn update_note_at(&self, user_id: i64, index: usize, content: &str) -> Result<bool> {
        Ok(self.book.lock().await.update_note_at(user_id, index, content))
    }

    async fn delete_note_at(&self, user_id: i64, index: usize) -> Result<Option<Note>> {
        Ok(self.book.lock().await.delete_note_at(user_id, index))
    }
}
