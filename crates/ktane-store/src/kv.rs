//! Key-value storage port and the in-memory adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The backing store cannot be used (no data directory, forced failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Raw blobs keyed by logical name.
pub trait KeyValueStore {
    /// Load a blob. Returns `NotFound` when missing.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
    fn set(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
    /// Remove a blob. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Load and deserialize `key`. Missing or empty means `Ok(None)`.
    fn get_json<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
        Self: Sized,
    {
        match self.get(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_json<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
        Self: Sized,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.set(key, &data)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, data)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Process-local store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    data: HashMap<String, Vec<u8>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `Unavailable`.
    pub fn set_failing(&self, fail: bool) {
        self.lock().fail = fail;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    /// Overwrite a key with raw bytes, bypassing the failure switch.
    pub fn put_raw(&self, key: &str, data: impl Into<Vec<u8>>) {
        self.lock().data.insert(key.to_string(), data.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(inner: &MemoryStoreInner) -> Result<(), StoreError> {
        if inner.fail {
            Err(StoreError::Unavailable("memory store set to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let inner = self.lock();
        Self::check(&inner)?;
        inner.data.get(key).cloned().ok_or(StoreError::NotFound)
    }

    fn set(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check(&inner)?;
        inner.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check(&inner)?;
        inner.data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_and_missing_keys() {
        let store = MemoryStore::new();
        assert_eq!(store.get_json::<Vec<u32>>("nums").unwrap(), None);
        store.set_json("nums", &vec![1u32, 2, 3]).unwrap();
        assert_eq!(store.get_json::<Vec<u32>>("nums").unwrap(), Some(vec![1, 2, 3]));
        store.remove("nums").unwrap();
        store.remove("nums").unwrap();
        assert!(!store.contains("nums"));
    }

    #[test]
    fn empty_blob_reads_as_none() {
        let store = MemoryStore::new();
        store.put_raw("blank", Vec::new());
        assert_eq!(store.get_json::<u32>("blank").unwrap(), None);
    }

    #[test]
    fn malformed_json_is_a_serde_error() {
        let store = MemoryStore::new();
        store.put_raw("bad", "{not json");
        assert!(matches!(
            store.get_json::<u32>("bad"),
            Err(StoreError::Serde(_))
        ));
    }

    #[test]
    fn failing_store_reports_unavailable() {
        let store = MemoryStore::new();
        let shared = store.clone();
        shared.set_failing(true);
        assert!(matches!(store.set("k", b"v"), Err(StoreError::Unavailable(_))));
        shared.set_failing(false);
        store.set("k", b"v").unwrap();
        assert_eq!(shared.get("k").unwrap(), b"v".to_vec());
    }
}
