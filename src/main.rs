use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use notekeeper::bot;
use notekeeper::config::{BotConfig, LogFormat};
use notekeeper::dialogue::NoteDialogueState;
use notekeeper::localization::init_localization;
use notekeeper::storage::open_store;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    // Initialize logging
    init_tracing(config.log_format);

    info!("Starting Notekeeper Telegram Bot");

    init_localization()?;

    let store = open_store(&config.storage).await?;

    // Initialize the bot
    let bot = Bot::new(&config.bot_token);

    info!(admin_id = config.admin_user_id, "Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![
            store,
            Arc::new(config),
            InMemStorage::<NoteDialogueState>::new()
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
