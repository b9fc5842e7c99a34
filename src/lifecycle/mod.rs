//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (context.rs):
//!     Load config → Build stores → Register services → Spawn background loops
//!
//! Shutdown (shutdown.rs):
//!     Teardown requested → broadcast → health monitor + cache sweeper exit
//!     → services stopped → registry cleared
//! ```
//!
//! # Design Decisions
//! - Background loops subscribe to one broadcast channel
//! - Teardown is explicit; nothing relies on Drop ordering

pub mod shutdown;

pub use shutdown::Shutdown;
