//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{KeyboardButton, KeyboardMarkup};

// Import localization
use crate::localization::{get_localization_manager, t_args_lang, t_lang};

// Import model types
use crate::note_model::{Note, UserProfile};

/// Telegram message length limit
pub const TELEGRAM_MAX_LEN: usize = 4096;

/// Placeholder for missing profile fields
const MISSING: &str = "—";

/// The four menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Add,
    List,
    Edit,
    Delete,
}

impl MenuAction {
    pub const ALL: [MenuAction; 4] = [
        MenuAction::Add,
        MenuAction::List,
        MenuAction::Edit,
        MenuAction::Delete,
    ];

    fn label_key(self) -> &'static str {
        match self {
            MenuAction::Add => "button-add",
            MenuAction::List => "button-list",
            MenuAction::Edit => "button-edit",
            MenuAction::Delete => "button-delete",
        }
    }

    pub fn label(self, language_code: Option<&str>) -> String {
        t_lang(self.label_key(), language_code)
    }

    /// Match a button label in any supported language
    pub fn from_label(text: &str) -> Option<MenuAction> {
        let manager = get_localization_manager();
        let text = text.trim();
        MenuAction::ALL.into_iter().find(|action| {
            manager
                .all_translations(action.label_key())
                .iter()
                .any(|label| label == text)
        })
    }
}

/// Create the 2x2 reply keyboard with the menu buttons
pub fn create_main_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    let button = |action: MenuAction| KeyboardButton::new(action.label(language_code));

    KeyboardMarkup::new(vec![
        vec![button(MenuAction::Add), button(MenuAction::List)],
        vec![button(MenuAction::Edit), button(MenuAction::Delete)],
    ])
    .resize_keyboard()
}

/// Format notes as a numbered list, one per line, starting at 1
pub fn format_notes_list(notes: &[Note]) -> String {
    notes
        .iter()
        .enumerate()
        .map(|(i, note)| format!("{}. {}", i + 1, note.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A prompt or header followed by the numbered list
pub fn format_notes_with_header(header: &str, notes: &[Note]) -> String {
    format!("{}\n\n{}", header, format_notes_list(notes))
}

/// One line per user: `id | name | @username`
pub fn format_user_list(users: &[UserProfile], language_code: Option<&str>) -> String {
    let count = users.len().to_string();
    let mut result = t_args_lang("users-total", &[("count", &count)], language_code);
    result.push_str("\n\n");

    let lines: Vec<String> = users
        .iter()
        .map(|user| {
            let username = user
                .username
                .as_deref()
                .map(|u| format!("@{u}"))
                .unwrap_or_else(|| MISSING.to_string());
            format!("{} | {} | {}", user.telegram_id, user.display_name(), username)
        })
        .collect();
    result.push_str(&lines.join("\n"));

    result
}

/// Profile card shown by `/checkuser <id>`
pub fn format_user_card(user: &UserProfile, note_count: usize, language_code: Option<&str>) -> String {
    let user_id = user.telegram_id.to_string();
    let name = user.display_name();
    let username = user.username.as_deref().unwrap_or(MISSING);
    let first_seen = user.first_seen.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let count = note_count.to_string();

    [
        t_lang("user-card-title", language_code),
        String::new(),
        t_args_lang("user-card-id", &[("user_id", &user_id)], language_code),
        t_args_lang("user-card-name", &[("name", &name)], language_code),
        t_args_lang("user-card-username", &[("username", username)], language_code),
        t_args_lang("user-card-first-seen", &[("first_seen", &first_seen)], language_code),
        t_args_lang("user-card-notes", &[("count", &count)], language_code),
    ]
    .join("\n")
}

/// Split a long reply into chunks of at most `max_len` bytes.
///
/// Splits at the last newline before the limit when there is one, otherwise
/// at the last character boundary.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut boundary = max_len;
        while !remaining.is_char_boundary(boundary) {
            boundary -= 1;
        }

        let split_at = match remaining[..boundary].rfind('\n') {
            Some(0) | None => boundary,
            Some(newline) => newline,
        };
        // A single character wider than the limit
        let split_at = if split_at == 0 {
            remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len())
        } else {
            split_at
        };

        let (chunk, rest) = remaining.split_at(split_at);
        chunks.push(chunk.to_string());
        remaining = rest.strip_prefix('\n').unwrap_or(rest);
    }

    chunks
}
