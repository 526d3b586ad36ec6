//! Error types for chatops-core

use thiserror::Error;

/// Main error type for chatops-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Hub API error: {0}")]
    Hub(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Menu error: {0}")]
    Menu(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("either a key id selector or an explicit chat id is required")]
    BadSendTarget,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for chatops-core
pub type Result<T> = std::result::Result<T, Error>;
