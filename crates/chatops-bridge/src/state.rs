//! Registration persistence
//!
//! The registry itself never touches disk; this host-side store
//! snapshots it to a JSON file whenever the dirty flag reports changes,
//! and once more on shutdown. Losing a write costs users one
//! re-registration, so the flush cadence stays simple.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use chatops_core::{Result, SessionRegistry};

/// Cadence of the dirty checks.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(2);

/// JSON-file store for the chat registration map.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted map. `Ok(None)` when the file does not exist
    /// yet (first run).
    pub fn load(&self) -> Result<Option<HashMap<String, String>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let map = serde_json::from_str(&content)?;
        Ok(Some(map))
    }

    /// Write the map via a temp file and rename, so a crash mid-write
    /// never leaves a truncated state file.
    pub fn save(&self, map: &HashMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Saved {} registrations to {}", map.len(), self.path.display());
        Ok(())
    }
}

/// Persist the registry whenever it reports changes, then once more on
/// shutdown. A failed write keeps the change pending so the next tick
/// retries it.
pub async fn flush_loop(
    store: StateFile,
    registry: Arc<SessionRegistry>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut pending = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                pending = pending || registry.take_dirty();
                if pending {
                    match store.save(&registry.snapshot()) {
                        Ok(()) => pending = false,
                        Err(e) => warn!("State save failed: {}", e),
                    }
                }
            }
            _ = shutdown.recv() => {
                pending = pending || registry.take_dirty();
                if pending {
                    if let Err(e) = store.save(&registry.snapshot()) {
                        warn!("Final state save failed: {}", e);
                    }
                }
                info!("State flusher stopped");
                return;
            }
        }
    }
}
