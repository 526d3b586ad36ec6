//! Broadcast fan-out
//!
//! Host-triggered sends addressed by key id rather than by chat. The
//! selector is expanded against the registry first (under its lock),
//! then the sends run sequentially with the lock released. A dead chat
//! is logged and skipped rather than aborting the rest of the fan-out.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::event::{SendPayload, Target};
use crate::registry::SessionRegistry;
use crate::transport::Transport;

pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
    transport: Arc<dyn Transport>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self { registry, transport }
    }

    /// Chat sessions a selector currently expands to, in sorted order.
    pub fn resolve_targets(&self, target: &Target) -> Vec<String> {
        match target {
            Target::All => self.registry.all_chat_ids(),
            Target::Keys(key_ids) => self.registry.chat_ids_for(key_ids),
        }
    }

    /// Send `payload` to every chat matched by `target`, or to a single
    /// explicit chat when no selector is given. A selector with no
    /// matching registrations sends nothing and reports zero.
    ///
    /// Returns the number of chats actually delivered to. Asking for
    /// neither a selector nor an explicit chat fails before any I/O.
    pub async fn send(
        &self,
        payload: &SendPayload,
        target: Option<&Target>,
        chat_id: Option<&str>,
    ) -> Result<usize> {
        let recipients = match (target, chat_id) {
            (Some(target), _) => self.resolve_targets(target),
            (None, Some(chat_id)) => vec![chat_id.to_string()],
            (None, None) => return Err(Error::BadSendTarget),
        };

        let mut sent = 0;
        for recipient in &recipients {
            debug!("Sending {} to chat {}", payload.kind(), recipient);
            match self.send_one(recipient, payload).await {
                Ok(()) => sent += 1,
                Err(e) => warn!("Send to chat {} failed: {}", recipient, e),
            }
        }

        Ok(sent)
    }

    async fn send_one(&self, chat_id: &str, payload: &SendPayload) -> Result<()> {
        match payload {
            SendPayload::Text { text } => self.transport.send_text(chat_id, text, None).await,
            SendPayload::Photo { media, caption } => {
                self.transport.send_photo(chat_id, media, caption.as_deref()).await
            }
            SendPayload::Video { media, caption } => {
                self.transport.send_video(chat_id, media, caption.as_deref()).await
            }
            SendPayload::Audio { media, caption } => {
                self.transport.send_audio(chat_id, media, caption.as_deref()).await
            }
            SendPayload::Document { media, caption } => {
                self.transport
                    .send_document(chat_id, media, caption.as_deref())
                    .await
            }
        }
    }
}
