//! A single cached value with its expiry metadata.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::now_millis;

/// A cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Write time, milliseconds since epoch.
    pub timestamp: u64,
    /// Time-to-live in milliseconds.
    pub ttl: u64,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, ttl: Duration, tags: BTreeSet<String>) -> Self {
        Self {
            data,
            timestamp: now_millis(),
            ttl: ttl.as_millis() as u64,
            tags,
        }
    }

    /// An entry is expired once strictly more than `ttl` has elapsed.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) > self.ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let entry = CacheEntry {
            data: 1,
            timestamp: 1_000,
            ttl: 500,
            tags: BTreeSet::new(),
        };
        assert!(!entry.is_expired_at(1_000));
        assert!(!entry.is_expired_at(1_500));
        assert!(entry.is_expired_at(1_501));
        // Clock moving backwards never expires an entry
        assert!(!entry.is_expired_at(10));
    }

    #[test]
    fn test_tags_skipped_when_empty() {
        let entry = CacheEntry::new("x", Duration::from_secs(1), BTreeSet::new());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("tags").is_none());

        let tagged = CacheEntry::new("x", Duration::from_secs(1), BTreeSet::from(["revenue".to_string()]));
        assert!(tagged.has_tag("revenue"));
        assert!(!tagged.has_tag("users"));
    }
}
