//! Service Orchestrator daemon
//!
//! Boots the application context and keeps its background tasks running.
//!
//! # Architecture Overview
//!
//! ```text
//!   presentation / CLI
//!          │
//!          ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │  facade: CachedServices, DashboardAggregator             │
//!   │        │                         │                       │
//!   │        ▼                         ▼                       │
//!   │  ┌───────────┐           ┌────────────────┐              │
//!   │  │   cache   │           │    registry    │◀── health    │
//!   │  │ TTL + tags│           │ status/metrics │    monitor   │
//!   │  └─────┬─────┘           └───────┬────────┘              │
//!   │        │                         │                       │
//!   │        ▼                         ▼                       │
//!   │  ┌───────────┐           ┌────────────────┐              │
//!   │  │  storage  │◀──────────│   transport    │──────────────┼──▶ REST backend
//!   │  │ key/value │  session  │ retry + bearer │              │
//!   │  └───────────┘           └────────────────┘              │
//!   │                                                          │
//!   │  config · observability · lifecycle · resilience          │
//!   └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use service_orchestrator::config::{load_config, OrchestratorConfig};
use service_orchestrator::observability::{logging, metrics};
use service_orchestrator::AppContext;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => load_config(&path)?,
        None => OrchestratorConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-orchestrator starting");

    tracing::info!(
        base_url = %config.transport.base_url,
        retry_attempts = config.transport.retry_attempts,
        cache_ttl_secs = config.cache.default_ttl_secs,
        health_interval_secs = config.registry.health_check_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let context = AppContext::bootstrap(config).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received SIGINT, shutting down");

    let report = context.registry().get_performance_report();
    tracing::info!(
        total_requests = report.total_requests,
        error_rate = report.error_rate,
        error_services = report.error_services,
        "Final performance report"
    );

    context.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
