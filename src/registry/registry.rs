//! The service registry.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures_util::future::join_all;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::clock::now_millis;
use crate::config::RegistryConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::health::HealthMonitor;
use crate::registry::record::{ServiceMetrics, ServiceRecord, ServiceStatus};
use crate::registry::report::{PerformanceReport, ServiceSnapshot};
use crate::registry::service::{ManagedService, ServiceError, ServiceId};

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service '{0}' is not registered")]
    UnknownService(ServiceId),

    #[error("failed to {action} service '{service}': {source}")]
    Lifecycle {
        service: ServiceId,
        action: &'static str,
        #[source]
        source: ServiceError,
    },
}

/// Mutable per-service state. Guarded by one mutex so every update is a
/// single writer; the guard is never held across an await.
#[derive(Debug)]
struct ServiceState {
    record: ServiceRecord,
    metrics: ServiceMetrics,
    last_recovery: Option<Instant>,
}

struct ServiceSlot {
    instance: Arc<dyn ManagedService>,
    any: Arc<dyn Any + Send + Sync>,
    state: Mutex<ServiceState>,
}

impl ServiceSlot {
    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

struct MonitorHandle {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

/// Named service instances with metrics, status and health monitoring.
///
/// Constructed once per application context and torn down with [`destroy`].
///
/// [`destroy`]: ServiceRegistry::destroy
pub struct ServiceRegistry {
    services: DashMap<ServiceId, Arc<ServiceSlot>>,
    config: RegistryConfig,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl ServiceRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            services: DashMap::new(),
            config,
            monitor: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register `instance` as `id` in the `active` state with zeroed counters.
    ///
    /// Registering an id twice replaces the earlier instance and its metrics.
    pub fn register_service<T: ManagedService>(&self, id: ServiceId, instance: Arc<T>, version: &str) {
        let slot = Arc::new(ServiceSlot {
            instance: instance.clone(),
            any: instance,
            state: Mutex::new(ServiceState {
                record: ServiceRecord::new(id.clone(), version),
                metrics: ServiceMetrics::default(),
                last_recovery: None,
            }),
        });

        if self.services.insert(id.clone(), slot).is_some() {
            tracing::warn!(service = %id, "Service re-registered, previous instance replaced");
        } else {
            tracing::info!(service = %id, version, "Service registered");
        }
        metrics::record_service_status(id.as_str(), ServiceStatus::Active.gauge_value());
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.services.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn service_ids(&self) -> Vec<ServiceId> {
        let mut ids: Vec<ServiceId> = self.services.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Look up a service by its concrete type.
    ///
    /// Counts as one use of the service. When the service is in `error` and
    /// recovery on access is enabled, one recovery is performed first
    /// (subject to the configured cooldown).
    pub fn get_service<T: ManagedService>(&self, id: &ServiceId) -> Option<Arc<T>> {
        let slot = self.access(id)?;
        match slot.any.clone().downcast::<T>() {
            Ok(instance) => Some(instance),
            Err(_) => {
                tracing::error!(
                    service = %id,
                    requested = std::any::type_name::<T>(),
                    "Service registered under a different type"
                );
                None
            }
        }
    }

    /// Type-erased lookup with the same access semantics as [`get_service`].
    ///
    /// [`get_service`]: ServiceRegistry::get_service
    pub fn get_instance(&self, id: &ServiceId) -> Option<Arc<dyn ManagedService>> {
        self.access(id).map(|slot| slot.instance.clone())
    }

    fn access(&self, id: &ServiceId) -> Option<Arc<ServiceSlot>> {
        let Some(slot) = self.slot(id) else {
            tracing::debug!(service = %id, "Service not found in registry");
            return None;
        };

        {
            let mut state = slot.lock();
            state.record.request_count += 1;

            if state.record.status == ServiceStatus::Error && self.config.recover_on_access {
                let cooled_down = state
                    .last_recovery
                    .map_or(true, |at| at.elapsed() >= self.config.recovery_cooldown());
                if cooled_down {
                    recover_locked(&mut state, "access");
                }
            }
        }

        Some(slot)
    }

    /// Current status, without touching usage counters.
    pub fn status(&self, id: &ServiceId) -> Option<ServiceStatus> {
        self.slot(id).map(|slot| slot.lock().record.status)
    }

    pub fn record(&self, id: &ServiceId) -> Option<ServiceRecord> {
        self.slot(id).map(|slot| slot.lock().record.clone())
    }

    pub fn metrics(&self, id: &ServiceId) -> Option<ServiceMetrics> {
        self.slot(id).map(|slot| slot.lock().metrics.clone())
    }

    pub fn snapshot(&self, id: &ServiceId) -> Option<ServiceSnapshot> {
        self.slot(id).map(|slot| {
            let state = slot.lock();
            ServiceSnapshot::new(state.record.clone(), state.metrics.clone())
        })
    }

    /// Reset the error count and force `active`.
    pub fn recover(&self, id: &ServiceId) -> Result<(), RegistryError> {
        let slot = self.require(id)?;
        let mut state = slot.lock();
        recover_locked(&mut state, "explicit");
        Ok(())
    }

    /// Fold one response into the service's metrics and re-evaluate its status.
    pub fn record_service_response(
        &self,
        id: &ServiceId,
        response_time_ms: f64,
        success: bool,
    ) -> Result<(), RegistryError> {
        let slot = self.require(id)?;
        let mut state = slot.lock();

        state.metrics.record(response_time_ms, success);
        state.record.average_response_time = state.metrics.average_response_time;
        if !success {
            state.record.error_count += 1;
        }

        let error_rate = state.metrics.error_rate();
        let next = match (state.record.status, success) {
            (ServiceStatus::Error, true) => ServiceStatus::Active,
            (ServiceStatus::Active, false) if error_rate > self.config.error_rate_threshold => {
                ServiceStatus::Error
            }
            (current, _) => current,
        };

        if next != state.record.status {
            match next {
                ServiceStatus::Error => tracing::warn!(
                    service = %id,
                    error_rate,
                    threshold = self.config.error_rate_threshold,
                    "Service degraded"
                ),
                _ => tracing::info!(service = %id, "Service recovered after successful response"),
            }
            state.record.status = next;
            metrics::record_service_status(id.as_str(), next.gauge_value());
        }
        Ok(())
    }

    /// Check every service once. Checks run concurrently; each service's
    /// state is updated as soon as its own check resolves.
    pub async fn run_health_checks(&self) {
        let slots: Vec<(ServiceId, Arc<ServiceSlot>)> = self
            .services
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let timeout = self.config.health_check_timeout();
        join_all(
            slots
                .into_iter()
                .map(|(id, slot)| check_service(id, slot, timeout)),
        )
        .await;
    }

    /// Spawn the periodic health-check loop. No-op when already running.
    pub fn start_health_monitor(self: &Arc<Self>) {
        let mut monitor = lock_monitor(&self.monitor);
        if monitor.is_some() {
            return;
        }

        let shutdown = Shutdown::new();
        let task = HealthMonitor::new(Arc::downgrade(self), self.config.health_check_interval())
            .spawn(shutdown.subscribe());
        *monitor = Some(MonitorHandle { shutdown, task });
    }

    pub fn is_monitoring(&self) -> bool {
        lock_monitor(&self.monitor).is_some()
    }

    async fn stop_health_monitor(&self) {
        let handle = lock_monitor(&self.monitor).take();
        if let Some(MonitorHandle { shutdown, task }) = handle {
            shutdown.trigger();
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Health monitor task failed");
            }
        }
    }

    pub async fn start_service(&self, id: &ServiceId) -> Result<(), RegistryError> {
        let slot = self.require(id)?;
        slot.instance
            .start()
            .await
            .map_err(|source| lifecycle_error(id, "start", source))?;
        set_status(id, &slot, ServiceStatus::Active);
        tracing::info!(service = %id, "Service started");
        Ok(())
    }

    pub async fn stop_service(&self, id: &ServiceId) -> Result<(), RegistryError> {
        let slot = self.require(id)?;
        slot.instance
            .stop()
            .await
            .map_err(|source| lifecycle_error(id, "stop", source))?;
        set_status(id, &slot, ServiceStatus::Inactive);
        tracing::info!(service = %id, "Service stopped");
        Ok(())
    }

    pub async fn restart_service(&self, id: &ServiceId) -> Result<(), RegistryError> {
        self.stop_service(id).await?;
        self.start_service(id).await
    }

    /// Start every service concurrently. Individual failures are logged.
    pub async fn start_all_services(&self) {
        let ids = self.service_ids();
        let results = join_all(ids.iter().map(|id| self.start_service(id))).await;
        log_failures(results);
    }

    /// Stop every service concurrently. Individual failures are logged.
    pub async fn stop_all_services(&self) {
        let ids = self.service_ids();
        let results = join_all(ids.iter().map(|id| self.stop_service(id))).await;
        log_failures(results);
    }

    pub fn get_performance_report(&self) -> PerformanceReport {
        let snapshots = self
            .service_ids()
            .iter()
            .filter_map(|id| self.snapshot(id))
            .collect();
        PerformanceReport::from_snapshots(snapshots)
    }

    /// Stop the health monitor and every service, then forget all services.
    pub async fn destroy(&self) {
        self.stop_health_monitor().await;
        self.stop_all_services().await;
        self.services.clear();
        tracing::info!("Service registry destroyed");
    }

    fn slot(&self, id: &ServiceId) -> Option<Arc<ServiceSlot>> {
        self.services.get(id).map(|r| r.value().clone())
    }

    fn require(&self, id: &ServiceId) -> Result<Arc<ServiceSlot>, RegistryError> {
        self.slot(id)
            .ok_or_else(|| RegistryError::UnknownService(id.clone()))
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.service_ids())
            .field("monitoring", &self.is_monitoring())
            .finish()
    }
}

async fn check_service(id: ServiceId, slot: Arc<ServiceSlot>, timeout: Duration) {
    if slot.lock().record.status == ServiceStatus::Inactive {
        return;
    }

    let outcome = match tokio::time::timeout(timeout, slot.instance.health_check()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", timeout.as_secs())),
    };

    let mut state = slot.lock();
    state.record.last_health_check = Some(now_millis());

    // Stopped while the check was in flight
    if state.record.status == ServiceStatus::Inactive {
        return;
    }

    match outcome {
        Ok(()) => {
            state.metrics.raise_uptime();
            if state.record.status == ServiceStatus::Error {
                recover_locked(&mut state, "health_check");
            }
        }
        Err(reason) => {
            state.metrics.lower_uptime();
            state.record.error_count += 1;
            if state.record.status != ServiceStatus::Error {
                tracing::warn!(service = %id, reason = %reason, "Health check failed, marking service degraded");
                state.record.status = ServiceStatus::Error;
                metrics::record_service_status(id.as_str(), ServiceStatus::Error.gauge_value());
            } else {
                tracing::debug!(service = %id, reason = %reason, "Health check still failing");
            }
        }
    }

    metrics::record_health_check(id.as_str(), state.record.status != ServiceStatus::Error);
    metrics::record_service_uptime(id.as_str(), state.metrics.uptime);
}

fn recover_locked(state: &mut ServiceState, trigger: &'static str) {
    tracing::info!(
        service = %state.record.id,
        trigger,
        previous_errors = state.record.error_count,
        "Recovering service"
    );
    state.record.error_count = 0;
    state.record.status = ServiceStatus::Active;
    state.last_recovery = Some(Instant::now());
    metrics::record_service_status(state.record.id.as_str(), ServiceStatus::Active.gauge_value());
}

fn set_status(id: &ServiceId, slot: &ServiceSlot, status: ServiceStatus) {
    slot.lock().record.status = status;
    metrics::record_service_status(id.as_str(), status.gauge_value());
}

fn lifecycle_error(id: &ServiceId, action: &'static str, source: ServiceError) -> RegistryError {
    RegistryError::Lifecycle {
        service: id.clone(),
        action,
        source,
    }
}

fn log_failures(results: Vec<Result<(), RegistryError>>) {
    for err in results.into_iter().filter_map(Result::err) {
        tracing::error!(error = %err, "Service lifecycle operation failed");
    }
}

fn lock_monitor(monitor: &Mutex<Option<MonitorHandle>>) -> MutexGuard<'_, Option<MonitorHandle>> {
    match monitor.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
