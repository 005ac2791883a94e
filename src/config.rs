//! # Configuration Module
//!
//! Runtime configuration read from the process environment (after `.env` is
//! loaded by `main`).

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Admin allowed to use `/send` and `/checkuser` unless overridden
pub const DEFAULT_ADMIN_USER_ID: i64 = 737163400;
pub const DEFAULT_NOTES_FILE: &str = "notes.json";

/// Where notes and users are persisted
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    Memory,
    JsonFile { path: PathBuf },
    Postgres { database_url: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub admin_user_id: i64,
    pub storage: StorageConfig,
    pub log_format: LogFormat,
}

impl BotConfig {
    /// Read the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = non_empty("TELEGRAM_BOT_TOKEN")
            .or_else(|| non_empty("BOT_TOKEN"))
            .context("TELEGRAM_BOT_TOKEN must be set")?;

        let admin_user_id = match non_empty("ADMIN_USER_ID") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("ADMIN_USER_ID must be an integer, got {raw:?}"))?,
            None => DEFAULT_ADMIN_USER_ID,
        };

        let database_url = non_empty("DATABASE_URL");
        let notes_file = || {
            PathBuf::from(non_empty("NOTES_FILE").unwrap_or_else(|| DEFAULT_NOTES_FILE.to_string()))
        };

        let backend = non_empty("STORAGE_BACKEND").map(|b| b.trim().to_lowercase());
        let storage = match backend.as_deref() {
            Some("memory") => StorageConfig::Memory,
            Some("json") => StorageConfig::JsonFile { path: notes_file() },
            Some("postgres") => StorageConfig::Postgres {
                database_url: database_url
                    .context("DATABASE_URL must be set for the postgres backend")?,
            },
            Some(other) => bail!("Unknown STORAGE_BACKEND {other:?}, expected json, postgres or memory"),
            None => match database_url {
                Some(database_url) => StorageConfig::Postgres { database_url },
                None => StorageConfig::JsonFile { path: notes_file() },
            },
        };

        let log_format = match non_empty("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            bot_token,
            admin_user_id,
            storage,
            log_format,
        })
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin_user_id
    }
}
