//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! AppContext::bootstrap
//!     → register_service(id, instance, version)   (status = active)
//!
//! caller → get_service(id)
//!     → request_count += 1
//!     → status == error? recover (cooldown permitting)
//!     → Arc<T>
//!
//! facade / caller → record_service_response(id, ms, success)
//!     → running mean, counters, error rate
//!     → error rate > threshold ⇒ error; success while error ⇒ active
//!
//! health.rs (every interval)
//!     → run_health_checks: all services checked concurrently
//!     → success: uptime +1 (≤100), error ⇒ active
//!     → failure: uptime −5 (≥0), ⇒ error
//! ```
//!
//! # Design Decisions
//! - Services are keyed by `ServiceId`, a closed enum with a plugin variant
//! - Each service's state sits behind its own mutex: one writer at a time
//! - Health-check failures become status and metric changes, never errors
//! - The monitor holds a weak reference; teardown is explicit via `destroy`

pub mod health;
pub mod record;
#[allow(clippy::module_inception)]
pub mod registry;
pub mod report;
pub mod service;

pub use record::{ServiceMetrics, ServiceRecord, ServiceStatus};
pub use registry::{RegistryError, ServiceRegistry};
pub use report::{PerformanceReport, ServiceSnapshot};
pub use service::{ManagedService, ServiceError, ServiceId};
