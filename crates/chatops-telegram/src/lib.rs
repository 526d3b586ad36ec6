//! chatops-telegram: Telegram transport for the automation bridge
//!
//! A hand-rolled Bot API client (long polling, no webhooks), update
//! classification into core events, and the poll loop. Implements
//! `chatops_core::Transport` so the decision logic stays provider-free.

pub mod api;
pub mod classify;
pub mod error;
pub mod poller;
pub mod types;

pub use api::TelegramApi;
pub use classify::classify;
pub use error::{Result, TelegramError};
pub use poller::PollerConfig;
