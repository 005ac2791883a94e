//! PostgreSQL note storage.
//!
//! Two tables: `users`, keyed by Telegram id, and `notes`, ordered by their
//! `BIGSERIAL` id. Positional operations resolve the position and mutate in a
//! single statement so no other write can slip in between.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::NoteStore;
use crate::note_model::{NewUser, Note, NoteId, UserProfile};

const MAX_CONNECTIONS: u32 = 5;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and make sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .context("Failed to create connection pool")?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        init_database_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id BIGINT PRIMARY KEY,
            username TEXT,
            first_name TEXT,
            last_name TEXT,
            first_seen TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS notes (
            id BIGSERIAL PRIMARY KEY,
            telegram_id BIGINT NOT NULL,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create notes table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS notes_owner_order ON notes (telegram_id, id)")
        .execute(pool)
        .await
        .context("Failed to create notes index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn user_from_row(row: &PgRow) -> Result<UserProfile, sqlx::Error> {
    Ok(UserProfile {
        telegram_id: row.try_get("telegram_id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        first_seen: row.try_get("first_seen")?,
    })
}

fn note_from_row(row: &PgRow) -> Result<Note, sqlx::Error> {
    Ok(Note {
        id: NoteId(row.try_get("id")?),
        user_id: row.try_get("telegram_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

// Both statements address the note at 0-based position `$2` of user `$1`
const UPDATE_AT_POSITION: &str = "UPDATE notes SET content = $3 WHERE id = (
        SELECT id FROM notes WHERE telegram_id = $1 ORDER BY id OFFSET $2 LIMIT 1
    )";

const DELETE_AT_POSITION: &str = "DELETE FROM notes WHERE id = (
        SELECT id FROM notes WHERE telegram_id = $1 ORDER BY id OFFSET $2 LIMIT 1
    )
    RETURNING id, telegram_id, content, created_at";

#[async_trait]
impl NoteStore for PostgresStore {
    async fn record_user(&self, user: &NewUser) -> Result<UserProfile> {
        let inserted = sqlx::query(
            "INSERT INTO users (telegram_id, username, first_name, last_name)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (telegram_id) DO NOTHING",
        )
        .bind(user.telegram_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&self.pool)
        .await
        .context("Failed to insert user")?;

        if inserted.rows_affected() > 0 {
            debug!(user_id = user.telegram_id, "Registered new user");
        }

        let row = sqlx::query(
            "SELECT telegram_id, username, first_name, last_name, first_seen
             FROM users WHERE telegram_id = $1",
        )
        .bind(user.telegram_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to read user after insert")?;

        Ok(user_from_row(&row)?)
    }

    async fn get_user(&self, telegram_id: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT telegram_id, username, first_name, last_name, first_seen
             FROM users WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read user")?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query(
            "SELECT telegram_id, username, first_name, last_name, first_seen
             FROM users ORDER BY first_seen, telegram_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        Ok(rows.iter().map(user_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, telegram_id, content, created_at
             FROM notes WHERE telegram_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list notes")?;

        Ok(rows.iter().map(note_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn count_notes(&self, user_id: i64) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE telegram_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count notes")?;

        Ok(count as usize)
    }

    async fn append_note(&self, user_id: i64, content: &str) -> Result<Note> {
        let row = sqlx::query(
            "INSERT INTO notes (telegram_id, content) VALUES ($1, $2)
             RETURNING id, telegram_id, content, created_at",
        )
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert note")?;

        let note = note_from_row(&row)?;
        info!(user_id, note_id = %note.id, "Note appended");
        Ok(note)
    }

    async fn update_note(&self, user_id: i64, note_id: NoteId, content: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE notes SET content = $3 WHERE telegram_id = $1 AND id = $2")
            .bind(user_id)
            .bind(note_id.0)
            .bind(content)
            .execute(&self.pool)
            .await
            .context("Failed to update note")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_note(&self, user_id: i64, note_id: NoteId) -> Result<Option<Note>> {
        let row = sqlx::query(
            "DELETE FROM notes WHERE telegram_id = $1 AND id = $2
             RETURNING id, telegram_id, content, created_at",
        )
        .bind(user_id)
        .bind(note_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to delete note")?;

        Ok(row.as_ref().map(note_from_row).transpose()?)
    }

    async fn update_note_at(&self, user_id: i64, index: usize, content: &str) -> Result<bool> {
        let result = sqlx::query(UPDATE_AT_POSITION)
            .bind(user_id)
            .bind(index as i64)
            .bind(content)
            .execute(&self.pool)
            .await
            .context("Failed to update note by position")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_note_at(&self, user_id: i64, index: usize) -> Result<Option<Note>> {
        let row = sqlx::query(DELETE_AT_POSITION)
            .bind(user_id)
            .bind(index as i64)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to delete note by position")?;

        Ok(row.as_ref().map(note_from_row).transpose()?)
    }
}
