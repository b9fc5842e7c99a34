//! Durable key/value storage.
//!
//! # Data Flow
//! ```text
//! CacheStore (namespaced entries) ─┐
//!                                  ├─→ KeyValueStore ─→ MemoryStore (process-local)
//! CredentialStore (fixed keys) ────┘                  └→ JsonFileStore (survives restarts)
//! ```
//!
//! # Design Decisions
//! - Values are opaque strings; callers own their serialization
//! - The trait is synchronous, writes are small and local
//! - Backends report faults as `StorageError`; callers decide whether to swallow

pub mod file;
pub mod memory;

use thiserror::Error;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage quota exceeded ({limit} entries)")]
    QuotaExceeded { limit: usize },
}

/// Minimal interface over a durable key/value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;
}
