//! Note dialogue module for handling conversation state with users.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use thiserror::Error;

use crate::note_model::NoteId;

/// Represents what the user's next message is expected to complete
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum NoteDialogueState {
    #[default]
    Idle,
    /// Next message is the text of a new note
    Add,
    /// Next message picks a note to edit from the listed snapshot
    EditIndex { listed: Vec<NoteId> },
    /// Next message is the new text of the chosen note
    EditContent { note_id: NoteId },
    /// Next message picks a note to delete from the listed snapshot
    Delete { listed: Vec<NoteId> },
}

/// Type alias for our note dialogue
pub type NoteDialogue = Dialogue<NoteDialogueState, InMemStorage<NoteDialogueState>>;

/// Rejected user input. Every variant ends the current operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("empty text")]
    EmptyText,
    #[error("not a number: {0:?}")]
    NotANumber(String),
    #[error("position {position} outside 1..={count}")]
    OutOfRange { position: i64, count: usize },
    #[error("command restricted to the admin")]
    Unauthorized,
    #[error("missing command arguments")]
    MissingArguments,
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
}

impl InputError {
    /// Localization key of the reply shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            InputError::EmptyText => "note-empty",
            InputError::NotANumber(_) => "not-a-number",
            InputError::OutOfRange { .. } => "invalid-number",
            InputError::Unauthorized => "admin-unauthorized",
            InputError::MissingArguments => "send-usage",
            InputError::InvalidUserId(_) => "invalid-user-id",
        }
    }
}

/// Validates note text, returning it trimmed
pub fn validate_note_text(text: &str) -> Result<String, InputError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(InputError::EmptyText);
    }

    Ok(trimmed.to_string())
}

/// Parses a 1-based note position and returns the 0-based index
pub fn parse_note_position(text: &str, count: usize) -> Result<usize, InputError> {
    let trimmed = text.trim();
    let position: i64 = trimmed
        .parse()
        .map_err(|_| InputError::NotANumber(trimmed.to_string()))?;

    if position < 1 || position as u64 > count as u64 {
        return Err(InputError::OutOfRange { position, count });
    }

    Ok((position - 1) as usize)
}
