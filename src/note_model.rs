//! # Note Model Module
//!
//! Core data types shared by the storage backends and the bot handlers:
//! registered users and their notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a note, never reused within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single note owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Profile data captured from Telegram when a user first writes to the bot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewUser {
    pub fn new(telegram_id: i64) -> Self {
        Self {
            telegram_id,
            ..Default::default()
        }
    }

    /// Build a profile from the Telegram sender of a message
    pub fn from_telegram(user: &teloxide::types::User) -> Self {
        Self {
            telegram_id: user.id.0 as i64,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
            last_name: user.last_name.clone(),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub first_seen: DateTime<Utc>,
}

impl UserProfile {
    /// Register a new user as seen right now
    pub fn register(new_user: &NewUser) -> Self {
        Self {
            telegram_id: new_user.telegram_id,
            username: new_user.username.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            first_seen: Utc::now(),
        }
    }

    /// First and last name joined, empty when neither is known
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }
}
