//! Telegram Bot API client
//!
//! Minimal surface for this bot: long-polling `getUpdates`, `sendMessage`,
//! and photo downloads via `getFile`. The bot token is baked into the
//! request URLs and must never be logged.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Authentication failed - check the bot token")]
    AuthFailed,
}

/// One long-poll result entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

impl Message {
    /// The largest rendition of an attached photo. Telegram orders the
    /// `photo` array by ascending size.
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo.as_ref().and_then(|sizes| sizes.last())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct FileInfo {
    #[serde(default)]
    file_path: Option<String>,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TelegramError> {
        if !self.ok {
            return Err(TelegramError::Api(
                self.description
                    .unwrap_or_else(|| "no description".to_string()),
            ));
        }
        self.result
            .ok_or_else(|| TelegramError::Api("empty result".to_string()))
    }
}

pub struct TelegramClient {
    client: Client,
    api_base: String,
    file_base: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(token: &str, poll_timeout_secs: u64) -> Self {
        // The HTTP timeout must outlast the server-side long-poll window.
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_base: format!("{}/bot{}", API_BASE, token),
            file_base: format!("{}/file/bot{}", API_BASE, token),
            poll_timeout_secs,
        }
    }

    /// Long-poll for new updates past `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": self.poll_timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Send a plain-text reply into a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _: Message = self
            .call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    /// Download the bytes of an uploaded file (photos, here).
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TelegramError> {
        let info: FileInfo = self.call("getFile", &json!({ "file_id": file_id })).await?;
        let path = info
            .file_path
            .ok_or_else(|| TelegramError::Api("file has no path".to_string()))?;

        let resp = self
            .client
            .get(format!("{}/{}", self.file_base, path))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(TelegramError::Api(format!(
                "HTTP {} downloading file",
                resp.status()
            )));
        }

        Ok(resp.bytes().await?.to_vec())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &serde_json::Value,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/{}", self.api_base, method);
        let resp = self.client.post(&url).json(params).send().await?;

        // A 401 means a bad token; surface that distinctly.
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(TelegramError::AuthFailed);
        }

        let body: ApiResponse<T> = resp.json().await?;
        body.into_result()
    }
}
