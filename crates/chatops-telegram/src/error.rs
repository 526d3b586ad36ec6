//! Error types for chatops-telegram

use thiserror::Error;

/// Main error type for chatops-telegram
#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Invalid chat id: {0}")]
    InvalidChatId(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<TelegramError> for chatops_core::Error {
    fn from(err: TelegramError) -> Self {
        chatops_core::Error::Transport(err.to_string())
    }
}

/// Result type alias for chatops-telegram
pub type Result<T> = std::result::Result<T, TelegramError>;
