//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, warn};

// Import configuration
use crate::config::BotConfig;

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::dialogue::{NoteDialogue, NoteDialogueState};

// Import storage types
use crate::note_model::NewUser;
use crate::storage::NoteStore;

// Import dialogue manager and admin handlers
use super::admin_handler::{handle_checkuser_command, handle_send_command};
use super::dialogue_manager::{advance, Reply, Transition};

// Import UI builder functions
use super::ui_builder::{create_main_keyboard, split_message, TELEGRAM_MAX_LEN};

/// Slash commands understood by the bot
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "show the keyboard and start over")]
    Start,
    #[command(description = "show how to use the bot")]
    Help,
    #[command(rename = "send", description = "admin: send a message to a user, /send <user_id> <text>")]
    SendTo(String),
    #[command(description = "admin: list users or show one, /checkuser [user_id]")]
    CheckUser(String),
}

fn language_code(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

fn sender_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .map(|user| user.id.0 as i64)
        .unwrap_or(msg.chat.id.0)
}

/// Record the sender of an inbound message, insert-if-absent.
///
/// Failures are logged and never abort handling of the message.
pub async fn record_sender(store: &dyn NoteStore, sender: Option<&NewUser>) {
    let Some(user) = sender else {
        return;
    };
    if let Err(e) = store.record_user(user).await {
        warn!(user_id = user.telegram_id, error = %e, "Failed to record user");
    }
}

/// Where a message that is not a known command goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Photos, stickers and the like
    NonText,
    /// `/something` the bot does not know
    UnknownCommand,
    /// Input for the note state machine
    Dialogue(&'a str),
}

/// Decide how to treat a non-command message.
///
/// Unknown slash commands never reach the state machine, so they cannot
/// complete a pending add or edit.
pub fn route(text: Option<&str>) -> Route<'_> {
    match text {
        None => Route::NonText,
        Some(text) if text.starts_with('/') => Route::UnknownCommand,
        Some(text) => Route::Dialogue(text),
    }
}

/// Record the sender, then run the message through [`route`] and the state
/// machine. Non-text messages and unknown commands keep `state` as it is.
pub async fn process_message(
    store: &dyn NoteStore,
    sender: Option<&NewUser>,
    user_id: i64,
    text: Option<&str>,
    state: NoteDialogueState,
    language_code: Option<&str>,
) -> Result<Transition> {
    record_sender(store, sender).await;

    let key = match route(text) {
        Route::Dialogue(text) => {
            debug!(user_id, message_length = text.len(), "Received text message from user");
            return advance(store, user_id, text, state, language_code).await;
        }
        Route::NonText => {
            debug!(user_id, "Received non-text message");
            "text-only"
        }
        Route::UnknownCommand => {
            debug!(user_id, "Received unknown command");
            "help-message"
        }
    };

    Ok(Transition {
        next: state,
        reply: Reply::with_keyboard(t_lang(key, language_code)),
    })
}

/// Send a reply in as many messages as it needs, keyboard on the last one
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply, language_code: Option<&str>) -> Result<()> {
    for chunk in reply.chunks() {
        let request = bot.send_message(chat_id, chunk.text);
        if chunk.with_keyboard {
            request.reply_markup(create_main_keyboard(language_code)).await?;
        } else {
            request.await?;
        }
    }
    Ok(())
}

/// Send text that may exceed Telegram's message limit
pub async fn send_long_message(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    for chunk in split_message(text, TELEGRAM_MAX_LEN) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// Handle a parsed slash command
pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: NoteDialogue,
    store: Arc<dyn NoteStore>,
    config: Arc<BotConfig>,
) -> Result<()> {
    let sender = msg.from.as_ref().map(NewUser::from_telegram);
    record_sender(store.as_ref(), sender.as_ref()).await;

    let caller_id = sender_id(&msg);
    let language_code = language_code(&msg);
    debug!(user_id = caller_id, command = ?cmd, "Received command");

    match cmd {
        Command::Start => {
            dialogue.update(NoteDialogueState::Idle).await?;
            let name = msg
                .from
                .as_ref()
                .map(|user| user.first_name.clone())
                .unwrap_or_default();
            let welcome = format!(
                "{}\n{}\n{}",
                t_args_lang("welcome-greeting", &[("name", &name)], language_code),
                t_lang("welcome-description", language_code),
                t_lang("welcome-buttons", language_code)
            );
            send_reply(&bot, msg.chat.id, &Reply::with_keyboard(welcome), language_code).await?;
        }
        Command::Help => {
            let help = format!(
                "{}\n\n{}",
                t_lang("help-message", language_code),
                Command::descriptions()
            );
            send_reply(&bot, msg.chat.id, &Reply::with_keyboard(help), language_code).await?;
        }
        Command::SendTo(args) => {
            handle_send_command(&bot, &msg, &config, caller_id, &args, language_code).await?;
        }
        Command::CheckUser(args) => {
            handle_checkuser_command(
                &bot,
                &msg,
                store.as_ref(),
                &config,
                caller_id,
                &args,
                language_code,
            )
            .await?;
        }
    }

    Ok(())
}

/// Handle any message that is not a known command
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: NoteDialogue,
    store: Arc<dyn NoteStore>,
) -> Result<()> {
    let sender = msg.from.as_ref().map(NewUser::from_telegram);
    let user_id = sender_id(&msg);
    let language_code = language_code(&msg);

    let state = dialogue.get().await?.unwrap_or_default();
    let transition = process_message(
        store.as_ref(),
        sender.as_ref(),
        user_id,
        msg.text(),
        state,
        language_code,
    )
    .await?;

    // The session only moves on once the user has seen the reply
    send_reply(&bot, msg.chat.id, &transition.reply, language_code).await?;
    dialogue.update(transition.next).await?;
    Ok(())
}
