//! Classification of raw Telegram updates into bridge events
//!
//! The decision logic never sees provider types; everything inbound is
//! mapped to [`InboundEvent`] here. Button callback data uses the same
//! slash-path grammar as typed commands, so a press and a typed command
//! classify identically.

use chatops_core::{EventKind, InboundEvent};

use crate::types::Update;

/// Classify one update. `None` means the bridge ignores it (media
/// messages, button presses without data, anything else unexpected).
pub fn classify(update: &Update) -> Option<InboundEvent> {
    if let Some(message) = &update.message {
        let text = message.text.as_deref()?;
        return Some(InboundEvent {
            chat_id: message.chat.id.to_string(),
            kind: classify_text(text),
        });
    }

    if let Some(callback) = &update.callback_query {
        let message = callback.message.as_ref()?;
        let data = callback.data.as_deref()?;
        return Some(InboundEvent {
            chat_id: message.chat.id.to_string(),
            kind: classify_text(data),
        });
    }

    None
}

/// Map message text to an event kind.
fn classify_text(text: &str) -> EventKind {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return EventKind::Text(trimmed.to_string());
    }

    let (path, query) = split_command(trimmed);
    match path {
        "/start" | "/help" => EventKind::StartHelp,
        "/getcommands" => EventKind::ListCommands,
        "/logout" => EventKind::Logout,
        _ => EventKind::Command {
            path: path.to_string(),
            query: query.to_string(),
        },
    }
}

/// Split `/path rest` or `/path?rest` into the path and the raw
/// argument string.
fn split_command(text: &str) -> (&str, &str) {
    match text.find(|c: char| c == '?' || c.is_whitespace()) {
        Some(idx) => {
            let (path, rest) = text.split_at(idx);
            let query = rest.strip_prefix('?').unwrap_or(rest).trim_start();
            (path, query)
        }
        None => (text, ""),
    }
}
