//! Cache subsystem.
//!
//! # Data Flow
//! ```text
//! set(key, value, {ttl, tags})
//!     → serialize to serde_json::Value
//!     → entries map + tag index (tag → keys)
//!     → write-through to KeyValueStore under `namespace + key`
//!
//! get(key)
//!     → entries map → expired? delete and miss : hit
//!
//! sweeper.rs (every cleanup interval)
//!     → cleanup() drops every expired entry
//! ```
//!
//! # Design Decisions
//! - Best effort: storage and serialization faults are logged, never returned
//! - Expiry is evaluated lazily on read and in bulk by the sweeper
//! - The tag index makes invalidation proportional to matching keys
//! - Persisted entries are re-hydrated on construction, expired ones dropped

pub mod entry;
pub mod memoize;
pub mod store;
pub mod sweeper;

pub use entry::CacheEntry;
pub use memoize::Memoized;
pub use store::{CacheFault, CacheOptions, CacheStats, CacheStore};
pub use sweeper::spawn_sweeper;
