//! Periodic health checking.
//!
//! # Responsibilities
//! - Sweep every registered service on a fixed interval
//! - Stop when signalled or when the registry is gone

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::registry::ServiceRegistry;

pub struct HealthMonitor {
    registry: Weak<ServiceRegistry>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Weak<ServiceRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Health monitor starting");

        // First sweep one interval after start, services begin `active`
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(registry) = self.registry.upgrade() else {
                        tracing::debug!("Registry dropped, health monitor exiting");
                        break;
                    };
                    registry.run_health_checks().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
