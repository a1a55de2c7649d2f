//! Current bomb and saved bombs.
//!
//! Every operation is best-effort: failures are logged and swallowed, and
//! readers fall back to "absent" or an empty list. Persistence trouble
//! never reaches the in-memory state.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ktane_logic::bomb::Bomb;

use crate::kv::{KeyValueStore, StoreError};

pub const CURRENT_BOMB_KEY: &str = "ktane_current_bomb";
pub const SAVED_BOMBS_KEY: &str = "ktane_saved_bombs";

/// A bomb stored under a player-chosen name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBomb {
    pub name: String,
    pub bomb: Bomb,
    /// Milliseconds since the Unix epoch.
    pub saved_at: i64,
}

/// Bomb persistence over any [`KeyValueStore`]. A detached storage has no
/// store at all: writes do nothing and reads come back empty.
#[derive(Debug, Clone)]
pub struct BombStorage<S> {
    store: Option<S>,
}

impl<S> BombStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store: Some(store) }
    }

    pub fn detached() -> Self {
        Self { store: None }
    }

    pub fn is_detached(&self) -> bool {
        self.store.is_none()
    }

    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }
}

impl<S: KeyValueStore> BombStorage<S> {
    pub fn current_bomb(&self) -> Option<Bomb> {
        let store = self.store.as_ref()?;
        match store.get_json::<Bomb>(CURRENT_BOMB_KEY) {
            Ok(bomb) => bomb,
            Err(e) => {
                warn!("Discarding unreadable current bomb: {e}");
                None
            }
        }
    }

    /// Persist the active bomb, or clear it with `None`.
    pub fn set_current_bomb(&self, bomb: Option<&Bomb>) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let result = match bomb {
            Some(bomb) => store.set_json(CURRENT_BOMB_KEY, bomb),
            None => store.remove(CURRENT_BOMB_KEY),
        };
        match result {
            Ok(()) => debug!("Current bomb {}", if bomb.is_some() { "stored" } else { "cleared" }),
            Err(e) => error!("Failed to save current bomb: {e}"),
        }
    }

    /// Saved bombs in insertion order. Entries that no longer parse are
    /// skipped.
    pub fn saved_bombs(&self) -> Vec<SavedBomb> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };
        let raw: Vec<serde_json::Value> = match store.get_json(SAVED_BOMBS_KEY) {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                warn!("Discarding unreadable saved bomb list: {e}");
                return Vec::new();
            }
        };
        raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<SavedBomb>(value) {
                Ok(saved) => Some(saved),
                Err(e) => {
                    warn!("Skipping unreadable saved bomb: {e}");
                    None
                }
            })
            .collect()
    }

    pub fn find_saved(&self, id: Uuid) -> Option<SavedBomb> {
        self.saved_bombs().into_iter().find(|s| s.bomb.id == id)
    }

    /// Insert or replace (by bomb id) a saved bomb. Other stored entries
    /// are written back untouched, even ones this build cannot read.
    pub fn save_bomb(&self, name: &str, bomb: &Bomb) {
        let Some(mut raw) = self.raw_saved() else {
            return;
        };
        let entry = SavedBomb {
            name: name.to_string(),
            bomb: bomb.clone(),
            saved_at: chrono::Utc::now().timestamp_millis(),
        };
        let entry = match serde_json::to_value(&entry) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to save bomb: {e}");
                return;
            }
        };
        match raw.iter_mut().find(|value| entry_id(value) == Some(bomb.id)) {
            Some(existing) => *existing = entry,
            None => raw.push(entry),
        }
        match self.write_saved(&raw) {
            Ok(()) => info!("Saved bomb \"{name}\" ({})", bomb.serial_number),
            Err(e) => error!("Failed to save bomb: {e}"),
        }
    }

    pub fn delete_saved_bomb(&self, id: Uuid) {
        let Some(mut raw) = self.raw_saved() else {
            return;
        };
        let before = raw.len();
        raw.retain(|value| entry_id(value) != Some(id));
        if raw.len() == before {
            debug!("No saved bomb with id {id}");
            return;
        }
        match self.write_saved(&raw) {
            Ok(()) => info!("Deleted saved bomb {id}"),
            Err(e) => error!("Failed to delete saved bomb: {e}"),
        }
    }

    /// The stored list as raw entries. `None` when there is no store or the
    /// list cannot be read, in which case nothing may be written back.
    fn raw_saved(&self) -> Option<Vec<serde_json::Value>> {
        let store = self.store.as_ref()?;
        match store.get_json::<Vec<serde_json::Value>>(SAVED_BOMBS_KEY) {
            Ok(list) => Some(list.unwrap_or_default()),
            Err(e) => {
                error!("Leaving unreadable saved bomb list untouched: {e}");
                None
            }
        }
    }

    fn write_saved(&self, raw: &[serde_json::Value]) -> Result<(), StoreError> {
        match self.store.as_ref() {
            Some(store) => store.set_json(SAVED_BOMBS_KEY, raw),
            None => Ok(()),
        }
    }
}

fn entry_id(value: &serde_json::Value) -> Option<Uuid> {
    value["bomb"]["id"].as_str()?.parse().ok()
}
