//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (compact text or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (service, key, attempt) instead of formatted strings
//! - Metrics are cheap and become no-ops when no recorder is installed
//! - `RUST_LOG` always wins over the configured level

pub mod logging;
pub mod metrics;
