//! Application context: builds and owns every long-lived component.
//!
//! # Responsibilities
//! - Choose storage backends from configuration
//! - Wire credentials, transport, cache and registry in dependency order
//! - Register the domain services under their well-known identifiers
//! - Start background tasks (health monitor, cache sweeper) and stop them on shutdown
//!
//! # Design Decisions
//! - Fail fast on transport construction errors; storage degrades to memory instead
//! - One context per process; presentation code receives it by reference

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::cache::{spawn_sweeper, CacheStore};
use crate::config::OrchestratorConfig;
use crate::facade::{CachedServices, DashboardAggregator, HttpAnalyticsApi};
use crate::lifecycle::Shutdown;
use crate::registry::{ServiceId, ServiceRegistry};
use crate::session::{CredentialStore, LogNavigator, LoginNavigator};
use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::transport::{RestResource, TransportClient, TransportError};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Domain areas served as plain REST collections, with their base paths.
const REST_SERVICES: [(ServiceId, &str); 5] = [
    (ServiceId::Auth, "/auth"),
    (ServiceId::Users, "/users"),
    (ServiceId::Posts, "/posts"),
    (ServiceId::Notifications, "/notifications"),
    (ServiceId::Admin, "/admin"),
];

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to build transport: {0}")]
    Transport(#[from] TransportError),
}

/// Everything the presentation layer needs, wired once.
pub struct AppContext {
    config: OrchestratorConfig,
    credentials: Arc<CredentialStore>,
    transport: Arc<TransportClient>,
    cache: Arc<CacheStore>,
    registry: Arc<ServiceRegistry>,
    analytics: Arc<HttpAnalyticsApi>,
    shutdown: Shutdown,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    /// Build the context and start its background tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn bootstrap(config: OrchestratorConfig) -> Result<Self, ContextError> {
        Self::bootstrap_with_navigator(config, Arc::new(LogNavigator)).await
    }

    /// Like [`bootstrap`], with a caller-supplied login redirect.
    ///
    /// [`bootstrap`]: AppContext::bootstrap
    pub async fn bootstrap_with_navigator(
        config: OrchestratorConfig,
        navigator: Arc<dyn LoginNavigator>,
    ) -> Result<Self, ContextError> {
        let session_path = config.session.persistence_path.as_deref();
        let cache_path = config.cache.persistence_path.as_deref();
        let session_store = open_store(session_path);
        // One file, one store: cache keys are namespaced apart from credentials
        let cache_store = if cache_path.is_some() && cache_path == session_path {
            session_store.clone()
        } else {
            open_store(cache_path)
        };

        let credentials = Arc::new(CredentialStore::new(session_store));
        let transport = Arc::new(TransportClient::new(
            config.transport.clone(),
            credentials.clone(),
            navigator,
        )?);
        let cache = Arc::new(CacheStore::with_backing(&config.cache, cache_store));
        let registry = Arc::new(ServiceRegistry::new(config.registry.clone()));
        let analytics = Arc::new(HttpAnalyticsApi::new(transport.clone()));

        registry.register_service(ServiceId::Api, transport.clone(), SERVICE_VERSION);
        for (id, path) in REST_SERVICES {
            let resource = Arc::new(RestResource::new(transport.clone(), path));
            registry.register_service(id, resource, SERVICE_VERSION);
        }
        registry.register_service(ServiceId::Analytics, analytics.clone(), SERVICE_VERSION);
        registry.start_all_services().await;
        registry.start_health_monitor();

        let shutdown = Shutdown::new();
        let sweeper = spawn_sweeper(cache.clone(), config.cache.cleanup_interval(), shutdown.subscribe());

        tracing::info!(
            base_url = %config.transport.base_url,
            services = registry.service_ids().len(),
            cached_entries = cache.len(),
            "Application context ready"
        );

        Ok(Self {
            config,
            credentials,
            transport,
            cache,
            registry,
            analytics,
            shutdown,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn transport(&self) -> &Arc<TransportClient> {
        &self.transport
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Cache-aside access whose fetches are attributed in the registry.
    pub fn cached_services(&self) -> CachedServices {
        CachedServices::new(self.cache.clone()).with_registry(self.registry.clone())
    }

    pub fn dashboard(&self) -> DashboardAggregator {
        DashboardAggregator::new(self.cached_services(), self.analytics.clone())
    }

    /// Stop background tasks and every registered service.
    pub async fn shutdown(&self) {
        self.shutdown.trigger();
        let sweeper = match self.sweeper.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = sweeper {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Cache sweeper ended abnormally");
            }
        }
        self.registry.destroy().await;
        tracing::info!("Application context shut down");
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("transport", &self.transport)
            .field("cache", &self.cache)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Open the durable store at `path`. Persistence is best-effort: an
/// unreadable file starts empty and an unusable path falls back to memory.
fn open_store(path: Option<&str>) -> Arc<dyn KeyValueStore> {
    let Some(path) = path else {
        return Arc::new(MemoryStore::new());
    };
    match JsonFileStore::open_or_reset(path) {
        Ok(store) => {
            tracing::debug!(path, "Opened file-backed store");
            Arc::new(store)
        }
        Err(e) => {
            tracing::error!(path, error = %e, "Failed to open file-backed store, falling back to memory");
            Arc::new(MemoryStore::new())
        }
    }
}
