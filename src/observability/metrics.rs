//! Metrics collection and exposition.
//!
//! # Metrics
//! - `orchestrator_transport_requests_total` (counter): by method, outcome
//! - `orchestrator_transport_request_duration_seconds` (histogram): by method
//! - `orchestrator_transport_retries_total` (counter)
//! - `orchestrator_auth_redirects_total` (counter)
//! - `orchestrator_cache_lookups_total` (counter): by result (hit/miss)
//! - `orchestrator_cache_evictions_total` (counter): by reason
//! - `orchestrator_cache_entries` (gauge)
//! - `orchestrator_cache_faults_total` (counter): by operation
//! - `orchestrator_service_status` (gauge): 1=active, 0=inactive, -1=error
//! - `orchestrator_service_uptime` (gauge): 0..=100
//! - `orchestrator_health_checks_total` (counter): by service, result

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transport_request(method: &str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "orchestrator_transport_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "orchestrator_transport_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_retry() {
    counter!("orchestrator_transport_retries_total").increment(1);
}

pub fn record_auth_redirect() {
    counter!("orchestrator_auth_redirects_total").increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("orchestrator_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_eviction(reason: &'static str, count: usize) {
    counter!("orchestrator_cache_evictions_total", "reason" => reason).increment(count as u64);
}

pub fn record_cache_size(size: usize) {
    gauge!("orchestrator_cache_entries").set(size as f64);
}

pub fn record_cache_fault(operation: &'static str) {
    counter!("orchestrator_cache_faults_total", "operation" => operation).increment(1);
}

pub fn record_service_status(service: &str, value: f64) {
    gauge!("orchestrator_service_status", "service" => service.to_string()).set(value);
}

pub fn record_service_uptime(service: &str, uptime: f64) {
    gauge!("orchestrator_service_uptime", "service" => service.to_string()).set(uptime);
}

pub fn record_health_check(service: &str, healthy: bool) {
    let result = if healthy { "healthy" } else { "unhealthy" };
    counter!(
        "orchestrator_health_checks_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
}
