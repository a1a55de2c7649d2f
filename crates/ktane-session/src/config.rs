//! Session settings, persisted next to the bombs.

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use ktane_logic::timer::TimerText;
use ktane_store::{KeyValueStore, StoreError};

pub const CONFIG_KEY: &str = "ktane_session_config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Countdown period in milliseconds. One tick removes one second.
    pub tick_interval_ms: u64,
    /// Timer pre-filled into a fresh bomb form.
    pub default_timer: TimerText,
    /// Persist the current bomb after every change.
    pub autosave: bool,
    /// Reload the last current bomb when a session starts.
    pub restore_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            default_timer: TimerText::default(),
            autosave: true,
            restore_on_start: true,
        }
    }
}

impl SessionConfig {
    /// Missing or unreadable settings fall back to the defaults.
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get_json::<Self>(CONFIG_KEY) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Using default session config: {e}");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore>(&self, store: &S) -> Result<(), StoreError> {
        store.set_json(CONFIG_KEY, self)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
