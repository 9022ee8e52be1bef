//! foutbot - long-polling Telegram bot process
//!
//! Loads the knowledge base once, then polls until externally terminated.
//! A workbook that fails to load degrades to an empty knowledge base; the
//! process keeps running and answers with its fixed "nothing found" reply.

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

use foutbot_lib::bot::{self, BotContext};
use foutbot_lib::config::Config;
use foutbot_lib::interaction_log::InteractionLog;
use foutbot_lib::kb::xlsx;
use foutbot_lib::telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().context("failed to load configuration")?;
    let token = Config::token().context("bot token missing")?;

    let kb = xlsx::load_or_empty(&config.workbook_path);
    tracing::info!(
        modules = kb.module_count(),
        codes = kb.code_count(),
        authorized_users = kb.authorized_user_count(),
        "knowledge base loaded"
    );

    if config.require_authorization && kb.authorized_user_count() == 0 {
        tracing::warn!("authorization is required but the allow-list is empty; nobody gets answers");
    }

    #[cfg(feature = "ocr")]
    if !foutbot_lib::ocr::tesseract_available() {
        tracing::warn!("tesseract not found on PATH; photo messages will fail recognition");
    }

    let client = TelegramClient::new(&token, config.poll_timeout_secs);
    let log = InteractionLog::new(config.log_path.clone());
    let ctx = BotContext { config, kb, log };

    bot::run(&ctx, &client).await;
    Ok(())
}
