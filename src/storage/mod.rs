//! Storage module for users and notes
//!
//! This module is split into one submodule per backend:
//! - `memory`: process-lifetime storage, also the data model of the JSON backend
//! - `json_file`: a single JSON file rewritten atomically after each mutation
//! - `postgres`: a PostgreSQL database accessed through `sqlx`
//!
//! The bot only talks to the [`NoteStore`] trait.

pub mod json_file;
pub mod memory;
pub mod postgres;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::StorageConfig;
use crate::note_model::{NewUser, Note, NoteId, UserProfile};

pub use json_file::JsonStore;
pub use memory::{MemoryStore, NoteBook};
pub use postgres::PostgresStore;

/// Persistence surface required by the bot.
///
/// Notes of a user are ordered oldest first. Positional operations take a
/// 0-based index into that order and must complete as one atomic step.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Return the stored profile, creating it if this user was never seen
    async fn record_user(&self, user: &NewUser) -> Result<UserProfile>;

    async fn get_user(&self, telegram_id: i64) -> Result<Option<UserProfile>>;

    /// All users, in order of first contact
    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>>;

    async fn count_notes(&self, user_id: i64) -> Result<usize>;

    /// Append a note at the end of the user's sequence
    async fn append_note(&self, user_id: i64, content: &str) -> Result<Note>;

    /// Overwrite a note by id. Returns false if the user has no such note.
    async fn update_note(&self, user_id: i64, note_id: NoteId, content: &str) -> Result<bool>;

    /// Remove a note by id, returning it if it existed
    async fn delete_note(&self, user_id: i64, note_id: NoteId) -> Result<Option<Note>>;

    /// Overwrite the note at a 0-based position
    async fn update_note_at(&self, user_id: i64, index: usize, content: &str) -> Result<bool>;

    /// Remove the note at a 0-based position, shifting later notes down
    async fn delete_note_at(&self, user_id: i64, index: usize) -> Result<Option<Note>>;
}

/// Open the backend selected by the configuration
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn NoteStore>> {
    let store: Arc<dyn NoteStore> = match config {
        StorageConfig::Memory => {
            info!(backend = "memory", "Using in-memory storage, notes are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StorageConfig::JsonFile { path } => {
            info!(backend = "json", path = %path.display(), "Opening JSON note store");
            Arc::new(
                JsonStore::open(path)
                    .await
                    .with_context(|| format!("Failed to open JSON store at {}", path.display()))?,
            )
        }
        StorageConfig::Postgres { database_url } => {
            info!(backend = "postgres", "Connecting to PostgreSQL note store");
            Arc::new(
                PostgresStore::connect(database_url)
                    .await
                    .context("Failed to connect to PostgreSQL")?,
            )
        }
    };

    Ok(store)
}
