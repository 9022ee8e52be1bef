//! Message handling: authorize, parse, resolve, format, reply, log
//!
//! The pure resolution path (`answer_text`) is separate from the transport
//! so the whole question-to-replies pipeline runs in tests and in the CLI
//! without a network.

use std::time::Duration;

use crate::config::Config;
use crate::interaction_log::{InteractionLog, InteractionRecord};
use crate::kb::search::KeywordFallback;
use crate::kb::{CodeRow, KnowledgeBase};
use crate::query;
use crate::telegram::{Message, TelegramClient};

const WELCOME_REPLY: &str = "Welkom! Stel je vraag met betrekking tot modules of foutcodes.";
const UNAUTHORIZED_REPLY: &str = "User not authorized";
const NO_MATCH_REPLY: &str = "Geen module of bijbehorende foutcode gevonden. \
                              Ook geen overeenkomende vraag in 'ALGEMEEN'.";

#[cfg(feature = "ocr")]
const NO_SCAN_MATCH_REPLY: &str = "Geen relevante informatie gevonden op basis van de afbeelding.";
#[cfg(feature = "ocr")]
const SCAN_REPLY_HEADER: &str = "Uit de afbeelding geëxtraheerde tekst:";
#[cfg(feature = "ocr")]
const PHOTO_UPLOADED: &str = "Foto geüpload";

/// Placeholder identity for senders without a username.
const UNKNOWN_USER: &str = "Onbekend";

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Everything a handler needs, constructed once at startup and read-only
/// afterwards.
pub struct BotContext {
    pub config: Config,
    pub kb: KnowledgeBase,
    pub log: InteractionLog,
}

/// Sender identity as far as Telegram reports it.
struct Identity {
    user_id: Option<i64>,
    username: Option<String>,
}

impl Identity {
    fn of(message: &Message) -> Self {
        Self {
            user_id: message.from.as_ref().map(|u| u.id),
            username: message.from.as_ref().and_then(|u| u.username.clone()),
        }
    }
}

/// Long-poll loop. Never returns; poll failures are logged and retried.
pub async fn run(ctx: &BotContext, client: &TelegramClient) {
    tracing::info!("bot started, polling for updates");

    let mut offset = 0i64;
    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::error!("getUpdates failed: {}", e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            if let Some(message) = &update.message {
                handle_update(ctx, client, message).await;
            }
        }
    }
}

/// Dispatch one inbound message. Without the `ocr` feature, photos are
/// silently ignored, matching the text-only deployment.
pub async fn handle_update(ctx: &BotContext, client: &TelegramClient, message: &Message) {
    if message.text.is_some() {
        handle_text(ctx, client, message).await;
        return;
    }

    #[cfg(feature = "ocr")]
    if message.photo.is_some() {
        handle_photo(ctx, client, message).await;
    }
}

async fn handle_text(ctx: &BotContext, client: &TelegramClient, message: &Message) {
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let chat_id = message.chat.id;

    // /start is the only command; other commands are ignored entirely.
    if let Some(command) = text.trim().strip_prefix('/') {
        if command == "start" || command.starts_with("start@") {
            send(client, chat_id, WELCOME_REPLY).await;
        }
        return;
    }

    let identity = Identity::of(message);
    if !authorized(ctx.config.require_authorization, &ctx.kb, identity.username.as_deref()) {
        // Unauthorized attempts get the fixed reply and are not logged.
        send(client, chat_id, UNAUTHORIZED_REPLY).await;
        return;
    }

    for reply in answer_text(&ctx.kb, text) {
        send(client, chat_id, &reply).await;
        log_interaction(ctx, &identity, text, &reply);
    }
}

#[cfg(feature = "ocr")]
async fn handle_photo(ctx: &BotContext, client: &TelegramClient, message: &Message) {
    let chat_id = message.chat.id;

    let identity = Identity::of(message);
    if !authorized(ctx.config.require_authorization, &ctx.kb, identity.username.as_deref()) {
        send(client, chat_id, UNAUTHORIZED_REPLY).await;
        return;
    }

    let Some(photo) = message.largest_photo() else {
        return;
    };
    let bytes = match client.download_file(&photo.file_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("photo download failed: {}", e);
            return;
        }
    };

    // Recognition failures become the reply text, so the user sees what
    // went wrong in place of extracted content.
    let extracted = crate::ocr::extract(&bytes)
        .unwrap_or_else(|e| format!("Fout bij het uitvoeren van OCR: {}", e));

    send(client, chat_id, &format!("{}\n{}", SCAN_REPLY_HEADER, extracted)).await;
    log_interaction(ctx, &identity, PHOTO_UPLOADED, &extracted);

    for reply in answer_scan(&ctx.kb, &extracted) {
        send(client, chat_id, &reply).await;
        log_interaction(ctx, &identity, &extracted, &reply);
    }
}

/// Replies for one inbound text, in send order.
pub fn answer_text(kb: &KnowledgeBase, text: &str) -> Vec<String> {
    answer_query(kb, text, NO_MATCH_REPLY)
}

/// Replies for the text extracted from a photo. Same pipeline as text, with
/// the photo-specific "nothing found" message.
#[cfg(feature = "ocr")]
pub fn answer_scan(kb: &KnowledgeBase, extracted: &str) -> Vec<String> {
    answer_query(kb, extracted, NO_SCAN_MATCH_REPLY)
}

fn answer_query(kb: &KnowledgeBase, text: &str, no_match_reply: &str) -> Vec<String> {
    let tokens = query::tokenize(text);
    let parsed = query::parse(&tokens, kb);

    if let Some(module) = parsed.module {
        parsed
            .codes
            .iter()
            .map(|code| match kb.resolve(&module, code) {
                Ok(row) => format_resolution(&module, code, row),
                Err(e) => format!("Foutcode {}: {}", code, e),
            })
            .collect()
    } else {
        let vraag = tokens.join(" ");
        match KeywordFallback::answer(&vraag, kb.general()) {
            Some(antwoord) => vec![format!("Vraag: {}\nAntwoord: {}", vraag, antwoord)],
            None => vec![no_match_reply.to_string()],
        }
    }
}

/// Structured reply for one resolved code: module, code, description, and
/// the numbered non-empty remedies.
fn format_resolution(module: &str, code: &str, row: &CodeRow) -> String {
    let oplossingen = row
        .filled_remedies()
        .enumerate()
        .map(|(i, remedy)| format!("{}. {}", i + 1, remedy))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Module: {}\nFoutcode: {}\nBeschrijving: {}\n\nOplossingen:\n{}",
        module, code, row.description, oplossingen
    )
}

/// Allow-list check. Senders without a username are treated as the fixed
/// unknown user, which is never on the list.
fn authorized(require_authorization: bool, kb: &KnowledgeBase, username: Option<&str>) -> bool {
    if !require_authorization {
        return true;
    }
    kb.is_authorized(username.unwrap_or(UNKNOWN_USER))
}

fn log_interaction(ctx: &BotContext, identity: &Identity, question: &str, response: &str) {
    let record = InteractionRecord {
        user_id: identity.user_id,
        username: identity.username.as_deref(),
        question,
        response,
    };
    if let Err(e) = ctx.log.append(&record) {
        tracing::warn!("failed to log interaction: {}", e);
    }
}

async fn send(client: &TelegramClient, chat_id: i64, text: &str) {
    if let Err(e) = client.send_message(chat_id, text).await {
        tracing::warn!("sendMessage failed: {}", e);
    }
}
