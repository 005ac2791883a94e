//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles commands and incoming text messages
//! - `admin_handler`: Handles the admin-only `/send` and `/checkuser` commands
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Manages dialogue state transitions and validation

pub mod admin_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::dialogue::NoteDialogueState;

// Re-export main handler functions for use in main.rs
pub use message_handler::{command_handler, message_handler, Command};

// Re-export the state machine entry point
pub use dialogue_manager::{advance, Reply, Transition};

/// Build the dispatcher handler tree.
///
/// Every message enters the per-chat dialogue first; parsed commands go to
/// [`command_handler`], everything else to [`message_handler`]. Expects a
/// `Arc<dyn NoteStore>`, an `Arc<BotConfig>` and the dialogue storage as
/// dependencies.
pub fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<NoteDialogueState>, NoteDialogueState>()
        .branch(
            teloxide::filter_command::<Command, _>()
                .endpoint(command_handler),
        )
        .branch(dptree::endpoint(message_handler))
}
