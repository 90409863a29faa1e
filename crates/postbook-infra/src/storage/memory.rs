//! In-memory storage implementation - used for tests and throwaway sessions.

use std::collections::HashMap;

use parking_lot::RwLock;

use postbook_core::ports::{KeyValueStore, StorageError};

/// In-memory key-value store using a HashMap behind a RwLock.
///
/// An optional byte quota (keys plus values) mimics the size limit of browser
/// local storage. Data is lost on process exit.
pub struct InMemoryStorage {
    store: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            quota: None,
        }
    }

    /// Reject writes that would push total usage above `limit` bytes.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            quota: Some(limit),
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        Self::usage(&self.store.read())
    }

    fn usage(store: &HashMap<String, String>) -> usize {
        store.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.store.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut store = self.store.write();

        if let Some(limit) = self.quota {
            let replaced = store.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let required = Self::usage(&store) - replaced + key.len() + value.len();
            if required > limit {
                tracing::warn!(key = %key, required, limit, "Storage quota exceeded");
                return Err(StorageError::QuotaExceeded { required, limit });
            }
        }

        store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.write().remove(key);
        Ok(())
    }
}
