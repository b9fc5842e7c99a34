//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! caller → TransportClient::{get,post,put,patch,delete}
//!     → attach bearer token (session::CredentialStore) + x-request-id
//!     → reqwest send with per-request timeout
//!         → no response:  RetryContext → backoff → resend (same request id)
//!         → 401:          clear credentials → LoginNavigator → Authentication
//!         → other non-2xx: Domain { status, message }
//!         → 2xx:          envelope.rs unwraps {success, data, message}
//!     → typed body or TransportError
//! ```
//!
//! # Design Decisions
//! - One logical call resolves or rejects exactly once; retries are internal
//! - The 401 path never enters the retry loop
//! - Request bodies are serialized once and reused across attempts

pub mod client;
pub mod envelope;
pub mod error;
pub mod resource;

pub use client::TransportClient;
pub use envelope::ApiEnvelope;
pub use error::TransportError;
pub use resource::RestResource;
