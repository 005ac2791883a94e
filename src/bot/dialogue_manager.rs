//! Dialogue Manager module for handling dialogue state transitions
//!
//! [`advance`] is the whole note state machine: it takes the current state
//! and the user's text, performs at most one storage mutation and returns the
//! next state with the reply to send. It never talks to Telegram, so it can be
//! driven directly from tests.

use anyhow::Result;
use tracing::{debug, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::dialogue::{parse_note_position, validate_note_text, InputError, NoteDialogueState};

// Import storage types
use crate::note_model::NoteId;
use crate::storage::NoteStore;

// Import UI builder functions
use super::ui_builder::{format_notes_with_header, split_message, MenuAction, TELEGRAM_MAX_LEN};

/// A reply to send back to the user
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// Attach the main menu keyboard
    pub with_keyboard: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            with_keyboard: false,
        }
    }

    pub fn with_keyboard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            with_keyboard: true,
        }
    }

    /// Split into messages that fit Telegram's limit.
    ///
    /// Only the last part carries the keyboard.
    pub fn chunks(&self) -> Vec<Reply> {
        let parts = split_message(&self.text, TELEGRAM_MAX_LEN);
        let last = parts.len().saturating_sub(1);
        parts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Reply {
                text,
                with_keyboard: self.with_keyboard && i == last,
            })
            .collect()
    }
}

/// Outcome of handling one message
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: NoteDialogueState,
    pub reply: Reply,
}

impl Transition {
    fn to(next: NoteDialogueState, reply: Reply) -> Self {
        Self { next, reply }
    }

    fn idle(reply: Reply) -> Self {
        Self::to(NoteDialogueState::Idle, reply)
    }

    fn rejected(error: InputError, user_id: i64, language_code: Option<&str>) -> Self {
        warn!(user_id, error = %error, "Rejected note input");
        Self::idle(Reply::text(t_lang(error.message_key(), language_code)))
    }
}

/// Advance the note dialogue by one user message
pub async fn advance(
    store: &dyn NoteStore,
    user_id: i64,
    text: &str,
    state: NoteDialogueState,
    language_code: Option<&str>,
) -> Result<Transition> {
    debug!(user_id, state = ?state, "Advancing note dialogue");

    match state {
        NoteDialogueState::Idle => handle_menu_input(store, user_id, text, language_code).await,
        NoteDialogueState::Add => handle_new_note_input(store, user_id, text, language_code).await,
        NoteDialogueState::EditIndex { listed } => {
            Ok(handle_edit_index_input(user_id, text, &listed, language_code))
        }
        NoteDialogueState::EditContent { note_id } => {
            handle_edit_content_input(store, user_id, text, note_id, language_code).await
        }
        NoteDialogueState::Delete { listed } => {
            handle_delete_input(store, user_id, text, &listed, language_code).await
        }
    }
}

/// Handle a message while no operation is pending
async fn handle_menu_input(
    store: &dyn NoteStore,
    user_id: i64,
    text: &str,
    language_code: Option<&str>,
) -> Result<Transition> {
    let Some(action) = MenuAction::from_label(text) else {
        return Ok(Transition::idle(Reply::with_keyboard(t_lang(
            "help-message",
            language_code,
        ))));
    };

    debug!(user_id, action = ?action, "Menu action selected");

    match action {
        MenuAction::Add => Ok(Transition::to(
            NoteDialogueState::Add,
            Reply::text(t_lang("add-prompt", language_code)),
        )),
        MenuAction::List => {
            let notes = store.list_notes(user_id).await?;
            let text = if notes.is_empty() {
                t_lang("no-notes", language_code)
            } else {
                format_notes_with_header(&t_lang("list-header", language_code), &notes)
            };
            Ok(Transition::idle(Reply::text(text)))
        }
        MenuAction::Edit | MenuAction::Delete => {
            let notes = store.list_notes(user_id).await?;
            let editing = action == MenuAction::Edit;

            if notes.is_empty() {
                let key = if editing { "no-notes-edit" } else { "no-notes-delete" };
                return Ok(Transition::idle(Reply::text(t_lang(key, language_code))));
            }

            let listed: Vec<NoteId> = notes.iter().map(|n| n.id).collect();
            let (prompt_key, next) = if editing {
                ("edit-index-prompt", NoteDialogueState::EditIndex { listed })
            } else {
                ("delete-prompt", NoteDialogueState::Delete { listed })
            };
            let prompt = format_notes_with_header(&t_lang(prompt_key, language_code), &notes);

            Ok(Transition::to(next, Reply::text(prompt)))
        }
    }
}

/// Handle the text of a new note
async fn handle_new_note_input(
    store: &dyn NoteStore,
    user_id: i64,
    text: &str,
    language_code: Option<&str>,
) -> Result<Transition> {
    let content = match validate_note_text(text) {
        Ok(content) => content,
        Err(e) => return Ok(Transition::rejected(e, user_id, language_code)),
    };

    let note = store.append_note(user_id, &content).await?;
    info!(user_id, note_id = %note.id, "Note added");

    Ok(Transition::idle(Reply::text(t_lang("note-added", language_code))))
}

/// Handle the position of the note to edit
fn handle_edit_index_input(
    user_id: i64,
    text: &str,
    listed: &[NoteId],
    language_code: Option<&str>,
) -> Transition {
    match parse_note_position(text, listed.len()) {
        Ok(index) => Transition::to(
            NoteDialogueState::EditContent {
                note_id: listed[index],
            },
            Reply::text(t_lang("edit-content-prompt", language_code)),
        ),
        Err(e) => Transition::rejected(e, user_id, language_code),
    }
}

/// Handle the replacement text of the chosen note
async fn handle_edit_content_input(
    store: &dyn NoteStore,
    user_id: i64,
    text: &str,
    note_id: NoteId,
    language_code: Option<&str>,
) -> Result<Transition> {
    let content = match validate_note_text(text) {
        Ok(content) => content,
        Err(_) => {
            warn!(user_id, note_id = %note_id, "Rejected empty replacement text");
            return Ok(Transition::idle(Reply::text(t_lang("edit-empty", language_code))));
        }
    };

    if !store.update_note(user_id, note_id, &content).await? {
        warn!(user_id, note_id = %note_id, "Note disappeared before it could be edited");
        return Ok(Transition::idle(Reply::text(t_lang("note-gone", language_code))));
    }

    info!(user_id, note_id = %note_id, "Note updated");
    Ok(Transition::idle(Reply::text(t_lang("note-updated", language_code))))
}

/// Handle the position of the note to delete
async fn handle_delete_input(
    store: &dyn NoteStore,
    user_id: i64,
    text: &str,
    listed: &[NoteId],
    language_code: Option<&str>,
) -> Result<Transition> {
    let index = match parse_note_position(text, listed.len()) {
        Ok(index) => index,
        Err(e) => return Ok(Transition::rejected(e, user_id, language_code)),
    };
    let note_id = listed[index];

    match store.delete_note(user_id, note_id).await? {
        Some(deleted) => {
            info!(user_id, note_id = %note_id, "Note deleted");
            Ok(Transition::idle(Reply::text(t_args_lang(
                "note-deleted",
                &[("note", &deleted.content)],
                language_code,
            ))))
        }
        None => {
            warn!(user_id, note_id = %note_id, "Note disappeared before it could be deleted");
            Ok(Transition::idle(Reply::text(t_lang("note-gone", language_code))))
        }
    }
}
