//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request (transport::client):
//!     → RetryContext created from TransportConfig
//!     → On failure without a response: retries.rs decides, backoff.rs sleeps
//!     → On 401 / domain error: no retry, error surfaces immediately
//!
//! Sustained failures (registry):
//!     → error rate over threshold marks the service `error`
//!     → health sweep or explicit recover brings it back
//! ```
//!
//! # Design Decisions
//! - Only response-less failures (timeout, connect, reset) are retried
//! - Jittered exponential backoff prevents thundering herd
//! - Retries are invisible to the caller: one call, one outcome

pub mod backoff;
pub mod retries;

pub use backoff::Backoff;
pub use retries::RetryContext;
