//! In-memory store.

use dashmap::DashMap;

use super::{KeyValueStore, StorageError};

/// A process-local store, optionally bounded in entry count.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: DashMap<String, String>,
    max_entries: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects new keys once `max_entries` are held.
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            inner: DashMap::new(),
            max_entries: Some(max_entries),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        if let Some(limit) = self.max_entries {
            if !self.inner.contains_key(key) && self.inner.len() >= limit {
                return Err(StorageError::QuotaExceeded { limit });
            }
        }
        self.inner.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.inner.iter().map(|r| r.key().clone()).collect())
    }
}
