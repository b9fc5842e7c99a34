//! TTL + tag cache store.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::cache::entry::CacheEntry;
use crate::cache::memoize::Memoized;
use crate::clock::now_millis;
use crate::config::CacheConfig;
use crate::observability::metrics;
use crate::storage::{KeyValueStore, StorageError};

/// Faults the cache absorbs. They are logged and the operation degrades to a miss.
#[derive(Debug, Error)]
pub enum CacheFault {
    #[error("failed to serialize value: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to deserialize value: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("backing store failure: {0}")]
    Backing(#[from] StorageError),
}

/// Per-write options.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Overrides the store's default TTL.
    pub ttl: Option<Duration>,
    pub tags: Vec<String>,
}

impl CacheOptions {
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub tags: usize,
}

/// Key/value cache with per-entry TTL and tag-based invalidation.
pub struct CacheStore {
    entries: DashMap<String, CacheEntry<Value>>,
    /// tag → keys currently carrying that tag.
    tag_index: DashMap<String, HashSet<String>>,
    default_ttl: Duration,
    namespace: String,
    backing: Option<Arc<dyn KeyValueStore>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    /// A cache with no backing store.
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            tag_index: DashMap::new(),
            default_ttl,
            namespace: String::new(),
            backing: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A cache persisted to `backing` under `config.namespace`.
    ///
    /// Unexpired entries already in the backing store are loaded; expired or
    /// unreadable ones are removed from it.
    pub fn with_backing(config: &CacheConfig, backing: Arc<dyn KeyValueStore>) -> Self {
        let cache = Self {
            namespace: config.namespace.clone(),
            backing: Some(backing),
            ..Self::in_memory(config.default_ttl())
        };
        cache.hydrate();
        cache
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, options: CacheOptions) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                report_fault("set", key, CacheFault::Serialize(e));
                return;
            }
        };

        let ttl = options.ttl.unwrap_or(self.default_ttl);
        let tags: BTreeSet<String> = options.tags.into_iter().collect();
        let entry = CacheEntry::new(data, ttl, tags);

        self.persist(key, &entry);

        let current_tags = entry.tags.clone();
        for tag in &current_tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        if let Some(previous) = self.entries.insert(key.to_string(), entry) {
            // Drop index links for tags the new entry no longer carries
            for tag in previous.tags.difference(&current_tags) {
                self.unindex(tag, key);
            }
        }

        metrics::record_cache_size(self.entries.len());
    }

    /// Typed read. A value that no longer deserializes into `T` is a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                report_fault("get", key, CacheFault::Deserialize(e));
                None
            }
        }
    }

    /// Raw read. Expired entries are deleted and reported as absent.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        let now = now_millis();
        if self.evict_if_expired(key, now) {
            self.record_miss();
            return None;
        }

        let data = self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.data.clone());
        match data {
            Some(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup(true);
                Some(data)
            }
            None => {
                self.record_miss();
                None
            }
        }
    }

    /// Whether an unexpired entry exists. Expired entries are deleted.
    pub fn has(&self, key: &str) -> bool {
        let now = now_millis();
        if self.evict_if_expired(key, now) {
            return false;
        }
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Remove every entry written with `tag`. Returns the number removed.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let keys = match self.tag_index.remove(tag) {
            Some((_, keys)) => keys,
            None => return 0,
        };

        let mut removed = 0;
        for key in keys {
            let tagged = self
                .entries
                .get(&key)
                .is_some_and(|entry| entry.has_tag(tag));
            if tagged && self.remove_entry(&key).is_some() {
                removed += 1;
            }
        }

        tracing::debug!(tag, removed, "Invalidated cache entries by tag");
        metrics::record_cache_eviction("tag", removed);
        removed
    }

    /// Remove every entry, including persisted ones under this namespace.
    pub fn clear(&self) {
        self.entries.clear();
        self.tag_index.clear();

        if let Some(backing) = &self.backing {
            match backing.keys() {
                Ok(keys) => {
                    for key in keys.iter().filter(|k| k.starts_with(&self.namespace)) {
                        if let Err(e) = backing.delete(key) {
                            report_fault("clear", key, e.into());
                        }
                    }
                }
                Err(e) => report_fault("clear", "*", e.into()),
            }
        }
        metrics::record_cache_size(0);
    }

    /// Bulk expiry sweep. Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        let now = now_millis();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|r| r.value().is_expired_at(now))
            .map(|r| r.key().clone())
            .collect();

        let removed = expired
            .iter()
            .filter(|key| self.take_expired(key, now).is_some())
            .count();

        metrics::record_cache_eviction("sweep", removed);
        metrics::record_cache_size(self.entries.len());
        removed
    }

    pub fn get_stats(&self) -> CacheStats {
        let now = now_millis();
        let mut valid = 0;
        let mut expired = 0;
        for r in self.entries.iter() {
            if r.value().is_expired_at(now) {
                expired += 1;
            } else {
                valid += 1;
            }
        }

        CacheStats {
            total_entries: valid + expired,
            valid_entries: valid,
            expired_entries: expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            tags: self.tag_index.len(),
        }
    }

    /// Wrap an async function so its results are cached per generated key.
    pub fn memoize<A, F, K>(self: &Arc<Self>, func: F, key_fn: K, options: CacheOptions) -> Memoized<A, F, K>
    where
        K: Fn(&A) -> String,
    {
        Memoized::new(self.clone(), func, key_fn, options)
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_lookup(false);
    }

    fn remove_entry(&self, key: &str) -> Option<CacheEntry<Value>> {
        let (_, entry) = self.entries.remove(key)?;
        self.detach(key, &entry);
        Some(entry)
    }

    /// Remove `key` only if it is still expired at `now`, checked and removed
    /// under one shard lock so a concurrent fresh `set` survives.
    fn take_expired(&self, key: &str, now: u64) -> Option<CacheEntry<Value>> {
        let (_, entry) = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired_at(now))?;
        self.detach(key, &entry);
        Some(entry)
    }

    fn evict_if_expired(&self, key: &str, now: u64) -> bool {
        let evicted = self.take_expired(key, now).is_some();
        if evicted {
            metrics::record_cache_eviction("expired", 1);
        }
        evicted
    }

    /// Drop index links and the persisted copy of a removed entry. Skipped
    /// for whatever a concurrent `set` has already re-established.
    fn detach(&self, key: &str, entry: &CacheEntry<Value>) {
        for tag in &entry.tags {
            self.unindex(tag, key);
        }
        if self.entries.contains_key(key) {
            return;
        }
        if let Some(backing) = &self.backing {
            if let Err(e) = backing.delete(&self.storage_key(key)) {
                report_fault("delete", key, e.into());
            }
        }
    }

    fn unindex(&self, tag: &str, key: &str) {
        if self.entries.get(key).is_some_and(|entry| entry.has_tag(tag)) {
            return;
        }
        if let Some(mut keys) = self.tag_index.get_mut(tag) {
            keys.remove(key);
        }
        self.tag_index.remove_if(tag, |_, keys| keys.is_empty());
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    fn persist(&self, key: &str, entry: &CacheEntry<Value>) {
        let Some(backing) = &self.backing else {
            return;
        };
        let result = serde_json::to_string(entry)
            .map_err(CacheFault::Serialize)
            .and_then(|raw| {
                backing
                    .set(&self.storage_key(key), raw)
                    .map_err(CacheFault::from)
            });
        if let Err(fault) = result {
            report_fault("persist", key, fault);
        }
    }

    fn hydrate(&self) {
        let Some(backing) = self.backing.clone() else {
            return;
        };
        let keys = match backing.keys() {
            Ok(keys) => keys,
            Err(e) => {
                report_fault("hydrate", "*", e.into());
                return;
            }
        };

        let now = now_millis();
        let mut loaded = 0;
        for storage_key in keys {
            let Some(key) = storage_key.strip_prefix(&self.namespace) else {
                continue;
            };
            let entry = match backing.get(&storage_key) {
                Ok(Some(raw)) => serde_json::from_str::<CacheEntry<Value>>(&raw).ok(),
                Ok(None) => continue,
                Err(e) => {
                    report_fault("hydrate", key, e.into());
                    continue;
                }
            };

            match entry {
                Some(entry) if !entry.is_expired_at(now) => {
                    for tag in &entry.tags {
                        self.tag_index
                            .entry(tag.clone())
                            .or_default()
                            .insert(key.to_string());
                    }
                    self.entries.insert(key.to_string(), entry);
                    loaded += 1;
                }
                _ => {
                    if let Err(e) = backing.delete(&storage_key) {
                        report_fault("hydrate", key, e.into());
                    }
                }
            }
        }

        if loaded > 0 {
            tracing::info!(loaded, namespace = %self.namespace, "Restored persisted cache entries");
        }
        metrics::record_cache_size(self.entries.len());
    }
}

fn report_fault(operation: &'static str, key: &str, fault: CacheFault) {
    tracing::warn!(operation, key, error = %fault, "Cache fault ignored");
    metrics::record_cache_fault(operation);
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .field("namespace", &self.namespace)
            .field("persistent", &self.backing.is_some())
            .finish()
    }
}
