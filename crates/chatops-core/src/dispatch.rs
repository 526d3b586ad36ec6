//! Inbound event dispatcher
//!
//! The session state machine: key registration, logout, help and command
//! execution. Every inbound event resolves to at least one reply, and
//! every failure past startup is converted into a chat message so the
//! transport loop keeps running.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::event::{EventKind, InboundEvent};
use crate::hub::{CommandBackend, ExecOutcome};
use crate::menu::CommandMenu;
use crate::registry::SessionRegistry;
use crate::transport::{EventHandler, Transport};

/// Routes classified events against the session registry, the menu and
/// the command backend.
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    menu: Arc<CommandMenu>,
    backend: Arc<dyn CommandBackend>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SessionRegistry>,
        menu: Arc<CommandMenu>,
        backend: Arc<dyn CommandBackend>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry,
            menu,
            backend,
            transport,
        }
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        self.transport.send_text(chat_id, text, None).await
    }

    async fn send_with_menu(&self, chat_id: &str, text: &str) -> Result<()> {
        self.transport
            .send_text(chat_id, text, Some(self.menu.keyboard()))
            .await
    }

    async fn send_usage(&self, chat_id: &str, key_id: &str) -> Result<()> {
        self.send_with_menu(chat_id, &self.menu.usage_text(key_id))
            .await
    }

    async fn on_start(&self, chat_id: &str) -> Result<()> {
        match self.registry.lookup(chat_id) {
            Some(key_id) => self.send_usage(chat_id, &key_id).await,
            None => self.send(chat_id, "Enter valid API key to start").await,
        }
    }

    /// Plain text: an echo for registered chats, a registration attempt
    /// for everyone else. The raw key is trimmed but otherwise never
    /// stored or logged.
    async fn on_text(&self, chat_id: &str, text: &str) -> Result<()> {
        if let Some(key_id) = self.registry.lookup(chat_id) {
            return self
                .send_with_menu(chat_id, &format!("API key: {key_id}"))
                .await;
        }

        match self.backend.resolve_key(text.trim()).await {
            Ok(Some(key_id)) => {
                self.registry.set(chat_id, &key_id);
                info!("Chat {} registered API key id {}", chat_id, key_id);
                self.send(chat_id, &format!("Registered API key: {key_id}"))
                    .await?;
                self.send_usage(chat_id, &key_id).await
            }
            Ok(None) => self.send(chat_id, "Invalid API key. Try again").await,
            Err(e) => {
                warn!("Key resolution failed: {}", e);
                self.send(chat_id, "Unable to verify API key, try again later")
                    .await
            }
        }
    }

    async fn on_logout(&self, chat_id: &str) -> Result<()> {
        if self.registry.clear(chat_id) {
            info!("Chat {} unregistered", chat_id);
            self.send(chat_id, "API key unregistered. Enter new API key to continue")
                .await
        } else {
            self.send(chat_id, "API key not registered").await
        }
    }

    async fn on_command(&self, chat_id: &str, path: &str, query: &str) -> Result<()> {
        let Some(key_id) = self.registry.lookup(chat_id) else {
            return self
                .send(chat_id, "Please enter valid API key before launching commands")
                .await;
        };

        let name = path.strip_prefix('/').unwrap_or(path);
        if !self.menu.is_command(name) {
            return self
                .send_with_menu(chat_id, &format!("Invalid command: {path}"))
                .await;
        }

        let outcome = self.backend.run(&key_id, name, query, chat_id).await;
        self.report_outcome(chat_id, path, outcome).await
    }

    async fn report_outcome(&self, chat_id: &str, path: &str, outcome: ExecOutcome) -> Result<()> {
        match outcome {
            ExecOutcome::Pending => {
                // No menu on this one: the user is expected to wait, not
                // to fire the next command.
                self.send(chat_id, &format!("{path} is still executing"))
                    .await
            }
            ExecOutcome::Completed { out: Some(out) } => {
                self.send_with_menu(chat_id, &format!("{path} executed, output:\n{out}"))
                    .await
            }
            ExecOutcome::Completed { out: None } => {
                self.send_with_menu(chat_id, &format!("{path} executed")).await
            }
            ExecOutcome::Failed { exitcode } => {
                warn!("Command {} exited with code {}", path, exitcode);
                self.send_with_menu(chat_id, &format!("{path} execution error"))
                    .await
            }
            ExecOutcome::AccessDenied => {
                self.send_with_menu(chat_id, &format!("Unable to execute {path}: access denied"))
                    .await
            }
            ExecOutcome::NotFound => {
                self.send_with_menu(
                    chat_id,
                    &format!("Unable to execute {path}: macro not found"),
                )
                .await
            }
            ExecOutcome::Other(detail) => {
                warn!("Command {} failed: {}", path, detail);
                self.send_with_menu(chat_id, &format!("Unable to execute {path}"))
                    .await
            }
        }
    }
}

#[async_trait]
impl EventHandler for Dispatcher {
    async fn handle(&self, event: InboundEvent) -> Result<()> {
        match &event.kind {
            EventKind::StartHelp => self.on_start(&event.chat_id).await,
            EventKind::ListCommands => {
                self.send(&event.chat_id, &self.menu.command_list()).await
            }
            EventKind::Logout => self.on_logout(&event.chat_id).await,
            EventKind::Text(text) => self.on_text(&event.chat_id, text).await,
            EventKind::Command { path, query } => {
                self.on_command(&event.chat_id, path, query).await
            }
        }
    }
}
