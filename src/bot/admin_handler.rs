//! Admin Handler module for the `/send` and `/checkuser` commands
//!
//! Authorization and argument parsing are decided by [`plan_send`] and
//! [`check_user_report`] without touching Telegram; the async handlers only
//! execute the result.

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{error, info, warn};

// Import configuration
use crate::config::BotConfig;

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::dialogue::InputError;

// Import storage types
use crate::storage::NoteStore;

// Import UI builder functions
use super::ui_builder::{format_user_card, format_user_list};
use super::message_handler::send_long_message;

/// What a `/send` command resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum SendPlan {
    /// Deliver `text` to `target`
    Deliver { target: i64, text: String },
    /// Refuse and answer the caller
    Refuse(InputError),
}

/// Decide what `/send <user_id> <message>` should do for this caller
pub fn plan_send(config: &BotConfig, caller_id: i64, args: &str) -> SendPlan {
    if !config.is_admin(caller_id) {
        return SendPlan::Refuse(InputError::Unauthorized);
    }

    let mut parts = args.split_whitespace();
    let (Some(raw_target), Some(_)) = (parts.next(), parts.next()) else {
        return SendPlan::Refuse(InputError::MissingArguments);
    };

    let Ok(target) = raw_target.parse::<i64>() else {
        return SendPlan::Refuse(InputError::InvalidUserId(raw_target.to_string()));
    };

    // Keep the message exactly as typed after the target id
    let text = args
        .trim_start()
        .strip_prefix(raw_target)
        .unwrap_or_default()
        .trim()
        .to_string();

    SendPlan::Deliver { target, text }
}

/// Build the `/checkuser [user_id]` reply for this caller
pub async fn check_user_report(
    store: &dyn NoteStore,
    config: &BotConfig,
    caller_id: i64,
    args: &str,
    language_code: Option<&str>,
) -> Result<String> {
    if !config.is_admin(caller_id) {
        warn!(user_id = caller_id, "Unauthorized /checkuser attempt");
        return Ok(t_lang(InputError::Unauthorized.message_key(), language_code));
    }

    let users = store.list_users().await?;
    if users.is_empty() {
        return Ok(t_lang("no-users", language_code));
    }

    let Some(raw_target) = args.split_whitespace().next() else {
        return Ok(format_user_list(&users, language_code));
    };

    let Ok(target) = raw_target.parse::<i64>() else {
        return Ok(t_lang("invalid-user-id", language_code));
    };

    match store.get_user(target).await? {
        Some(user) => {
            let note_count = store.count_notes(target).await?;
            Ok(format_user_card(&user, note_count, language_code))
        }
        None => Ok(t_args_lang(
            "user-not-found",
            &[("user_id", &target.to_string())],
            language_code,
        )),
    }
}

/// Handle `/send <user_id> <message>`
pub async fn handle_send_command(
    bot: &Bot,
    msg: &Message,
    config: &BotConfig,
    caller_id: i64,
    args: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let (target, text) = match plan_send(config, caller_id, args) {
        SendPlan::Deliver { target, text } => (target, text),
        SendPlan::Refuse(e) => {
            warn!(user_id = caller_id, error = %e, "Refused /send command");
            bot.send_message(msg.chat.id, t_lang(e.message_key(), language_code))
                .await?;
            return Ok(());
        }
    };

    let target_str = target.to_string();
    let reply = match bot.send_message(ChatId(target), text).await {
        Ok(_) => {
            info!(admin_id = caller_id, target_id = target, "Admin message delivered");
            t_args_lang("send-success", &[("user_id", &target_str)], language_code)
        }
        Err(e) => {
            error!(admin_id = caller_id, target_id = target, error = %e, "Admin message delivery failed");
            t_args_lang("send-failed", &[("error", &e.to_string())], language_code)
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Handle `/checkuser [user_id]`
pub async fn handle_checkuser_command(
    bot: &Bot,
    msg: &Message,
    store: &dyn NoteStore,
    config: &BotConfig,
    caller_id: i64,
    args: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let report = check_user_report(store, config, caller_id, args, language_code).await?;
    send_long_message(bot, msg.chat.id, &report).await
}
