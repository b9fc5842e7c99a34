//! Aggregate reporting across registered services.

use serde::{Deserialize, Serialize};

use crate::registry::record::{ServiceMetrics, ServiceRecord, ServiceStatus};

/// Combined view of one service at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub record: ServiceRecord,
    pub metrics: ServiceMetrics,
    /// Derived from `metrics` when the snapshot is taken.
    pub error_rate: f64,
}

impl ServiceSnapshot {
    pub fn new(record: ServiceRecord, metrics: ServiceMetrics) -> Self {
        let error_rate = metrics.error_rate();
        Self {
            record,
            metrics,
            error_rate,
        }
    }
}

/// Totals across every registered service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_services: usize,
    pub active_services: usize,
    pub inactive_services: usize,
    pub error_services: usize,
    pub total_requests: u64,
    /// Request-weighted mean response time in milliseconds.
    pub average_response_time: f64,
    /// Failed over total recorded requests.
    pub error_rate: f64,
    pub services: Vec<ServiceSnapshot>,
}

impl PerformanceReport {
    pub fn from_snapshots(services: Vec<ServiceSnapshot>) -> Self {
        let count = |status: ServiceStatus| {
            services
                .iter()
                .filter(|s| s.record.status == status)
                .count()
        };

        let total_requests: u64 = services.iter().map(|s| s.metrics.total_requests).sum();
        let failed: u64 = services.iter().map(|s| s.metrics.failed_requests).sum();
        let weighted: f64 = services
            .iter()
            .map(|s| s.metrics.average_response_time * s.metrics.total_requests as f64)
            .sum();

        let (average_response_time, error_rate) = if total_requests == 0 {
            (0.0, 0.0)
        } else {
            (
                weighted / total_requests as f64,
                failed as f64 / total_requests as f64,
            )
        };

        Self {
            total_services: services.len(),
            active_services: count(ServiceStatus::Active),
            inactive_services: count(ServiceStatus::Inactive),
            error_services: count(ServiceStatus::Error),
            total_requests,
            average_response_time,
            error_rate,
            services,
        }
    }
}
