//! Persistence for the KTANE assistant.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`kv`] | `KeyValueStore` port, `StoreError`, in-memory adapter |
//! | [`fs`] | JSON-file adapter under the platform data directory |
//! | [`bombs`] | Current bomb and named saved bombs, best-effort |

pub mod bombs;
pub mod fs;
pub mod kv;

pub use bombs::{BombStorage, SavedBomb};
pub use fs::FsStore;
pub use kv::{KeyValueStore, MemoryStore, StoreError};
