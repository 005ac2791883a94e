//! JSON file note storage.
//!
//! The whole [`NoteBook`] is kept in memory and written back after every
//! mutation. Writes go to a temporary file next to the target which is then
//! renamed over it, so readers never observe a partial file. All mutations
//! take the same lock, which serializes writers within the process.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::memory::NoteBook;
use super::NoteStore;
use crate::note_model::{NewUser, Note, NoteId, UserProfile};

pub struct JsonStore {
    path: PathBuf,
    book: Mutex<NoteBook>,
}

impl JsonStore {
    /// Open the store, loading existing data if the file is present.
    ///
    /// A corrupt file is renamed to `<name>.corrupt` and the store starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let book = load_book(&path).await?;
        Ok(Self {
            path,
            book: Mutex::new(book),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply a mutation in place and persist it before releasing the lock.
    ///
    /// Operations that report no change never touch the file. On a failed
    /// write the in-memory state is reloaded from the last persisted file.
    async fn mutate<T>(&self, op: impl FnOnce(&mut NoteBook) -> (T, bool)) -> Result<T> {
        let mut book = self.book.lock().await;
        let (value, changed) = op(&mut book);
        if changed {
            if let Err(e) = write_book(&self.path, &book).await {
                error!(path = %self.path.display(), error = %e, "Failed to persist note store");
                *book = load_book(&self.path)
                    .await
                    .context("Failed to restore note store after a failed write")?;
                return Err(e);
            }
        }
        Ok(value)
    }
}

async fn load_book(path: &Path) -> Result<NoteBook> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "Note file not found, starting empty");
            return Ok(NoteBook::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    match serde_json::from_slice::<NoteBook>(&bytes) {
        Ok(book) => {
            debug!(path = %path.display(), "Loaded note file");
            Ok(book)
        }
        Err(e) => {
            let mut aside = path.as_os_str().to_owned();
            aside.push(".corrupt");
            let aside = PathBuf::from(aside);
            warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %e,
                "Note file is corrupt, moving it aside and starting empty"
            );
            tokio::fs::rename(path, &aside)
                .await
                .with_context(|| format!("Failed to move corrupt file {}", path.display()))?;
            Ok(NoteBook::default())
        }
    }
}

async fn write_book(path: &Path, book: &NoteBook) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(book).context("Failed to serialize note store")?;
    let target = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        use std::io::Write;

        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut temp_file = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        temp_file
            .write_all(&bytes)
            .context("Failed to write temporary note file")?;
        temp_file
            .as_file()
            .sync_all()
            .context("Failed to flush temporary note file")?;
        temp_file
            .persist(&target)
            .with_context(|| format!("Failed to replace {}", target.display()))?;
        Ok(())
    })
    .await
    .context("Note file writer task panicked")?
}

#[async_trait]
impl NoteStore for JsonStore {
    async fn record_user(&self, user: &NewUser) -> Result<UserProfile> {
        let profile = self.mutate(|book| book.record_user(user)).await?;
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
        let note = self
            .mutate(|book| (book.append_note(user_id, content), true))
            .await?;
        info!(user_id, note_id = %note.id, "Note appended");
        Ok(note)
    }

    async fn update_note(&self, user_id: i64, note_id: NoteId, content: &str) -> Result<bool> {
        self.mutate(|book| {
            let updated = book.update_note(user_id, note_id, content);
            (updated, updated)
        })
        .await
    }

    async fn delete_note(&self, user_id: i64, note_id: NoteId) -> Result<Option<Note>> {
        self.mutate(|book| {
            let removed = book.delete_note(user_id, note_id);
            let changed = removed.is_some();
            (removed, changed)
        })
        .await
    }

    async fn update_note_at(&self, user_id: i64, index: usize, content: &str) -> Result<bool> {
        self.mutate(|book| {
            let updated = book.update_note_at(user_id, index, content);
            (updated, updated)
        })
        .await
    }

    async fn delete_note_at(&self, user_id: i64, index: usize) -> Result<Option<Note>> {
        self.mutate(|book| {
            let removed = book.delete_note_at(user_id, index);
            let changed = removed.is_some();
            (removed, changed)
        })
        .await
    }
}
