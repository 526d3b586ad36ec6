//! Chat session registry
//!
//! Maps chat session ids to registered API key ids. A chat is
//! authenticated exactly when it has an entry here; unknown ids read as
//! unauthenticated. The map and its dirty flag live under one lock so a
//! mutation and its persistence mark are atomic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct AuthState {
    map: HashMap<String, String>,
    dirty: bool,
}

/// Thread-safe registry of authenticated chat sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    state: Mutex<AuthState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, AuthState> {
        // A poisoned lock still holds a usable map
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Key id registered for a chat, if any.
    pub fn lookup(&self, chat_id: &str) -> Option<String> {
        self.locked().map.get(chat_id).cloned()
    }

    /// Register (or replace) the key id for a chat and mark the
    /// registry dirty.
    pub fn set(&self, chat_id: &str, key_id: &str) {
        let mut state = self.locked();
        state.map.insert(chat_id.to_string(), key_id.to_string());
        state.dirty = true;
    }

    /// Unregister a chat. Returns whether it was registered; the dirty
    /// flag is only raised when an entry was actually removed.
    pub fn clear(&self, chat_id: &str) -> bool {
        let mut state = self.locked();
        let removed = state.map.remove(chat_id).is_some();
        if removed {
            state.dirty = true;
        }
        removed
    }

    /// All registered chat ids, sorted for deterministic fan-out order.
    pub fn all_chat_ids(&self) -> Vec<String> {
        let state = self.locked();
        let mut ids: Vec<String> = state.map.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Chat ids registered under any of the given key ids, sorted.
    pub fn chat_ids_for(&self, key_ids: &[String]) -> Vec<String> {
        let state = self.locked();
        let mut ids: Vec<String> = state
            .map
            .iter()
            .filter(|(_, registered)| key_ids.iter().any(|k| k == *registered))
            .map(|(chat_id, _)| chat_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Copy of the current mapping, for host persistence.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.locked().map.clone()
    }

    /// Replace the mapping wholesale (host restore at startup). Restored
    /// state is already persisted, so the dirty flag is lowered.
    pub fn restore(&self, map: HashMap<String, String>) {
        let mut state = self.locked();
        state.map = map;
        state.dirty = false;
    }

    /// Read and reset the dirty flag in one step.
    pub fn take_dirty(&self) -> bool {
        let mut state = self.locked();
        std::mem::take(&mut state.dirty)
    }

    /// Number of registered chats.
    pub fn len(&self) -> usize {
        self.locked().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
