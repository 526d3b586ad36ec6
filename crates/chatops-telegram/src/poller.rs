//! Long-polling loop for the Telegram transport
//!
//! Pulls updates, classifies them and hands the events to the
//! dispatcher. Poll failures back off exponentially up to a configurable
//! cap; handler failures are logged and never stop the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use chatops_core::EventHandler;

use crate::api::TelegramApi;
use crate::classify::classify;

/// Default cap for the poll error backoff, in seconds.
const DEFAULT_RETRY_CAP: u64 = 60;

/// Poll loop settings.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Long-poll timeout in seconds; also the idle pacing.
    pub interval: u64,

    /// Cap for the error backoff, in seconds.
    pub retry_cap: Option<u64>,
}

/// Run the polling loop until the shutdown channel fires.
pub async fn run(
    api: Arc<TelegramApi>,
    handler: Arc<dyn EventHandler>,
    config: PollerConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let retry_cap = config.retry_cap.unwrap_or(DEFAULT_RETRY_CAP).max(1);
    let mut offset: Option<i64> = None;
    let mut backoff = 1u64;

    info!("Telegram poller started (interval: {}s)", config.interval);

    loop {
        let updates = tokio::select! {
            result = api.get_updates(offset, config.interval) => result,
            _ = shutdown.recv() => {
                info!("Telegram poller shutting down");
                return;
            }
        };

        match updates {
            Ok(updates) => {
                backoff = 1;

                for update in updates {
                    offset = Some(update.update_id + 1);

                    // Ack button presses up front so the spinner stops
                    // even when the press classifies to nothing.
                    if let Some(callback) = &update.callback_query {
                        if let Err(e) = api.answer_callback_query(&callback.id).await {
                            debug!("Callback ack failed: {}", e);
                        }
                    }

                    let Some(event) = classify(&update) else {
                        debug!("Ignoring update {}", update.update_id);
                        continue;
                    };

                    debug!("Update {} -> {:?}", update.update_id, event.kind);
                    if let Err(e) = handler.handle(event).await {
                        error!("Event handler error: {}", e);
                    }
                }
            }
            Err(e) => {
                warn!("getUpdates failed, retrying in {}s: {}", backoff, e);
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(retry_cap);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatops_core::{EventKind, InboundEvent, Result};
    use serde_json::json;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct ForwardingHandler {
        tx: mpsc::UnboundedSender<InboundEvent>,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for ForwardingHandler {
        async fn handle(&self, event: InboundEvent) -> Result<()> {
            let _ = self.tx.send(event);
            if self.fail {
                return Err(chatops_core::Error::Transport("send failed".to_string()));
            }
            Ok(())
        }
    }

    fn poller_config() -> PollerConfig {
        PollerConfig {
            interval: 0,
            retry_cap: Some(1),
        }
    }

    #[tokio::test]
    async fn test_poller_delivers_classified_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/bot.*/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [{
                    "update_id": 900,
                    "message": {
                        "message_id": 1,
                        "chat": { "id": 7 },
                        "text": "/logout"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let api = Arc::new(TelegramApi::with_base_url("test-token", &server.uri()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = Arc::new(ForwardingHandler { tx, fail: false });
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(run(api, handler, poller_config(), shutdown_rx));

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed");
        assert_eq!(event.chat_id, "7");
        assert_eq!(event.kind, EventKind::Logout);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_poller_acks_button_presses_and_survives_handler_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/bot.*/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [{
                    "update_id": 901,
                    "callback_query": {
                        "id": "cb-9",
                        "message": {
                            "message_id": 2,
                            "chat": { "id": 7 }
                        },
                        "data": "/status"
                    }
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"/bot.*/answerCallbackQuery"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })),
            )
            .expect(1..)
            .mount(&server)
            .await;

        let api = Arc::new(TelegramApi::with_base_url("test-token", &server.uri()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = Arc::new(ForwardingHandler { tx, fail: true });
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(run(api, handler, poller_config(), shutdown_rx));

        // Two deliveries prove the loop kept going after a handler error.
        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("channel closed");
            assert_eq!(
                event.kind,
                EventKind::Command {
                    path: "/status".to_string(),
                    query: "".to_string(),
                }
            );
        }

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }
}
