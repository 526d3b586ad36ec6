//! Raw HTTP calls to the Telegram Bot API
//!
//! Wraps reqwest for `sendMessage`, the media send methods, `getUpdates`
//! and `answerCallbackQuery`. The [`Transport`] impl at the bottom is
//! what the rest of the bridge sees; everything above it is
//! Telegram-specific plumbing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use chatops_core::{Keyboard, Transport};

use crate::error::{Result, TelegramError};
use crate::types::{ApiResponse, InlineKeyboardMarkup, SentMessage, Update};

/// HTTP budget for sends and acks.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra HTTP budget on top of the server-side long-poll timeout.
const POLL_TIMEOUT_MARGIN: u64 = 10;

/// Low-level Telegram Bot API client.
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    /// Create a new API client for the given bot token.
    pub fn new(bot_token: &str) -> Self {
        Self::with_base_url(bot_token, "https://api.telegram.org")
    }

    /// Create a new API client with a custom base URL (for testing).
    pub fn with_base_url(bot_token: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), bot_token),
        }
    }

    /// Send a text message; returns the sent message's id.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<i64> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = json!(markup);
        }

        debug!("sendMessage to chat_id={chat_id}");

        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let api_response: ApiResponse<SentMessage> = response.json().await?;
        if !api_response.ok {
            let description = api_response.description.unwrap_or_default();
            warn!("sendMessage failed: {description}");
            return Err(TelegramError::Api(description));
        }

        Ok(api_response.result.map(|m| m.message_id).unwrap_or(0))
    }

    /// Send one media attachment by URL or file id.
    ///
    /// `method` and `field` come in pairs (`sendPhoto`/`photo` and so
    /// on); Telegram replies with the full message object, which is
    /// discarded.
    async fn send_media(
        &self,
        method: &str,
        field: &str,
        chat_id: i64,
        media: &str,
        caption: Option<&str>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            field: media,
        });
        if let Some(caption) = caption {
            body["caption"] = json!(caption);
        }

        debug!("{method} to chat_id={chat_id}");

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let api_response: ApiResponse<serde_json::Value> = response.json().await?;
        if !api_response.ok {
            let description = api_response.description.unwrap_or_default();
            warn!("{method} failed: {description}");
            return Err(TelegramError::Api(description));
        }

        Ok(())
    }

    /// Long-poll for new updates.
    ///
    /// `offset` should be `last_update_id + 1` to acknowledge previously
    /// received updates. `timeout` is the server-side hold in seconds.
    pub async fn get_updates(&self, offset: Option<i64>, timeout: u64) -> Result<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let response = self
            .client
            .post(format!("{}/getUpdates", self.base_url))
            .timeout(Duration::from_secs(timeout + POLL_TIMEOUT_MARGIN))
            .json(&body)
            .send()
            .await?;

        let api_response: ApiResponse<Vec<Update>> = response.json().await?;
        if !api_response.ok {
            let description = api_response.description.unwrap_or_default();
            warn!("getUpdates failed: {description}");
            return Err(TelegramError::Api(description));
        }

        Ok(api_response.result.unwrap_or_default())
    }

    /// Acknowledge a callback query (dismisses the button spinner).
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let body = json!({ "callback_query_id": callback_query_id });

        let response = self
            .client
            .post(format!("{}/answerCallbackQuery", self.base_url))
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let api_response: ApiResponse<bool> = response.json().await?;
        if !api_response.ok {
            let description = api_response.description.unwrap_or_default();
            warn!("answerCallbackQuery failed: {description}");
            return Err(TelegramError::Api(description));
        }

        Ok(())
    }
}

fn parse_chat_id(chat_id: &str) -> Result<i64> {
    chat_id
        .parse()
        .map_err(|_| TelegramError::InvalidChatId(chat_id.to_string()))
}

#[async_trait]
impl Transport for TelegramApi {
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> chatops_core::Result<()> {
        let id = parse_chat_id(chat_id)?;
        let markup = keyboard.map(InlineKeyboardMarkup::from);
        self.send_message(id, text, markup).await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: &str,
        media: &str,
        caption: Option<&str>,
    ) -> chatops_core::Result<()> {
        let id = parse_chat_id(chat_id)?;
        Ok(self.send_media("sendPhoto", "photo", id, media, caption).await?)
    }

    async fn send_video(
        &self,
        chat_id: &str,
        media: &str,
        caption: Option<&str>,
    ) -> chatops_core::Result<()> {
        let id = parse_chat_id(chat_id)?;
        Ok(self.send_media("sendVideo", "video", id, media, caption).await?)
    }

    async fn send_audio(
        &self,
        chat_id: &str,
        media: &str,
        caption: Option<&str>,
    ) -> chatops_core::Result<()> {
        let id = parse_chat_id(chat_id)?;
        Ok(self.send_media("sendAudio", "audio", id, media, caption).await?)
    }

    async fn send_document(
        &self,
        chat_id: &str,
        media: &str,
        caption: Option<&str>,
    ) -> chatops_core::Result<()> {
        let id = parse_chat_id(chat_id)?;
        Ok(self
            .send_media("sendDocument", "document", id, media, caption)
            .await?)
    }
}
