//! Shared event and payload types
//!
//! Everything the dispatcher and the broadcast layer exchange with the
//! transport crates goes through these types; provider wire formats never
//! cross the crate boundary.

/// One classified inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Opaque chat session id (stringified provider chat id).
    pub chat_id: String,

    /// What the user did.
    pub kind: EventKind,
}

/// The recognized inbound event shapes.
///
/// Transports classify raw updates into exactly one of these; the
/// dispatcher matches on the union exhaustively, so adding a variant
/// forces every routing decision to be revisited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `/start` or `/help`.
    StartHelp,

    /// `/getcommands`.
    ListCommands,

    /// `/logout`.
    Logout,

    /// Plain message text (no leading slash).
    Text(String),

    /// Any other slash path, with its raw argument string.
    Command { path: String, query: String },
}

/// Broadcast target selector for host-triggered sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every registered chat session (`*`).
    All,

    /// Every chat session registered under any of these key ids.
    Keys(Vec<String>),
}

/// Payload for one outbound send, one variant per send primitive.
///
/// Media is referenced by URL or provider file id; the bridge never
/// handles raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendPayload {
    Text { text: String },
    Photo { media: String, caption: Option<String> },
    Video { media: String, caption: Option<String> },
    Audio { media: String, caption: Option<String> },
    Document { media: String, caption: Option<String> },
}

impl SendPayload {
    /// Variant name, for logs and request validation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SendPayload::Text { .. } => "text",
            SendPayload::Photo { .. } => "photo",
            SendPayload::Video { .. } => "video",
            SendPayload::Audio { .. } => "audio",
            SendPayload::Document { .. } => "document",
        }
    }
}

/// Provider-neutral inline keyboard: rows of labeled buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

/// One keyboard button. Pressing it feeds `path` back through the
/// transport as if the user had typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub path: String,
}
