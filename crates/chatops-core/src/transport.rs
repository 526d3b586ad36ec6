//! Transport seams
//!
//! The chat provider sits behind `Transport` and the decision logic
//! behind `EventHandler`, so either side can be swapped or stubbed
//! without touching the other.

use async_trait::async_trait;

use crate::error::Result;
use crate::event::{InboundEvent, Keyboard};

/// Outbound send primitives offered by the chat transport.
///
/// All five address a chat by its opaque id and differ only in payload
/// shape. Media is a URL or a provider file id.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str, keyboard: Option<&Keyboard>)
        -> Result<()>;

    async fn send_photo(&self, chat_id: &str, media: &str, caption: Option<&str>) -> Result<()>;

    async fn send_video(&self, chat_id: &str, media: &str, caption: Option<&str>) -> Result<()>;

    async fn send_audio(&self, chat_id: &str, media: &str, caption: Option<&str>) -> Result<()>;

    async fn send_document(&self, chat_id: &str, media: &str, caption: Option<&str>) -> Result<()>;
}

/// Consumer of classified inbound events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: InboundEvent) -> Result<()>;
}
