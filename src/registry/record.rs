//! Per-service state: status, record and metrics.

use serde::{Deserialize, Serialize};

use crate::registry::service::ServiceId;

/// Service status.
///
/// # State Transitions
/// ```text
/// Active → Error:    recorded failure pushes error rate over threshold,
///                    or a health check fails
/// Error → Active:    next successful response, successful health check,
///                    or explicit recovery
/// Active ⇄ Inactive: explicit stop / start only
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
    Error,
}

impl ServiceStatus {
    /// Value exported on the status gauge.
    pub fn gauge_value(self) -> f64 {
        match self {
            ServiceStatus::Active => 1.0,
            ServiceStatus::Inactive => 0.0,
            ServiceStatus::Error => -1.0,
        }
    }
}

/// Identity and usage of a registered service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: ServiceId,
    pub version: String,
    pub status: ServiceStatus,
    /// Last health check, milliseconds since epoch.
    pub last_health_check: Option<u64>,
    /// Failures since the last recovery.
    pub error_count: u64,
    /// Number of lookups through the registry.
    pub request_count: u64,
    /// Running mean of recorded response times in milliseconds.
    pub average_response_time: f64,
}

impl ServiceRecord {
    pub fn new(id: ServiceId, version: impl Into<String>) -> Self {
        Self {
            id,
            version: version.into(),
            status: ServiceStatus::Active,
            last_health_check: None,
            error_count: 0,
            request_count: 0,
            average_response_time: 0.0,
        }
    }
}

/// Upper bound of the uptime gauge.
pub const UPTIME_MAX: f64 = 100.0;

/// Recorded response outcomes for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Running mean in milliseconds, weighted by `total_requests`.
    pub average_response_time: f64,
    /// Health gauge within `0..=100`.
    pub uptime: f64,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self {
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            average_response_time: 0.0,
            uptime: UPTIME_MAX,
        }
    }
}

impl ServiceMetrics {
    /// `failed / total`, or 0 before any request.
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.failed_requests as f64 / self.total_requests as f64
        }
    }

    /// Fold one response into the counters and the running mean.
    pub fn record(&mut self, response_time_ms: f64, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
        let n = self.total_requests as f64;
        self.average_response_time = (self.average_response_time * (n - 1.0) + response_time_ms) / n;
    }

    pub fn raise_uptime(&mut self) {
        self.uptime = (self.uptime + 1.0).min(UPTIME_MAX);
    }

    pub fn lower_uptime(&mut self) {
        self.uptime = (self.uptime - 5.0).max(0.0);
    }
}
