//! Cached service facade.
//!
//! # Data Flow
//! ```text
//! presentation → DashboardAggregator::fetch
//!     → join of four CachedServices::get_or_fetch calls
//!         → CacheStore hit? return
//!         → miss: AnalyticsApi call → store under CachePolicy TTL + tags
//!                 → latency/outcome recorded on the registry
//!     → DashboardSnapshot (a failed source is a `None` slot)
//! ```
//!
//! # Design Decisions
//! - TTL follows data volatility: seconds for live data, minutes for reports
//! - Tags group keys so a whole data class can be evicted at once
//! - An aggregate never fails because one of its sources did

pub mod analytics;
pub mod cached;
pub mod dashboard;
pub mod policy;

pub use analytics::{AnalyticsApi, HttpAnalyticsApi};
pub use cached::CachedServices;
pub use dashboard::{DashboardAggregator, DashboardSnapshot};
pub use policy::CachePolicy;
