//! Get-or-fetch over the cache store.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheOptions, CacheStore};
use crate::registry::{ServiceId, ServiceRegistry};

/// Cache-aside access to domain service calls.
#[derive(Debug, Clone)]
pub struct CachedServices {
    cache: Arc<CacheStore>,
    registry: Option<Arc<ServiceRegistry>>,
}

impl CachedServices {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self {
            cache,
            registry: None,
        }
    }

    /// Record fetch latency and outcome on `registry`.
    pub fn with_registry(mut self, registry: Arc<ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Return the cached value for `key`, or run `fetcher` and cache its result.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        options: impl Into<CacheOptions>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.fetch(None, key, fetcher, options.into()).await
    }

    /// Like [`get_or_fetch`], attributing the fetch to `service` in the registry.
    ///
    /// [`get_or_fetch`]: CachedServices::get_or_fetch
    pub async fn get_or_fetch_for<T, E, F, Fut>(
        &self,
        service: &ServiceId,
        key: &str,
        fetcher: F,
        options: impl Into<CacheOptions>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.fetch(Some(service), key, fetcher, options.into()).await
    }

    /// Evict every entry carrying `tag`.
    pub fn invalidate(&self, tag: &str) -> usize {
        self.cache.invalidate_by_tag(tag)
    }

    async fn fetch<T, E, F, Fut>(
        &self,
        service: Option<&ServiceId>,
        key: &str,
        fetcher: F,
        options: CacheOptions,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.cache.get::<T>(key) {
            tracing::trace!(key, "Cache hit");
            return Ok(hit);
        }

        let started = Instant::now();
        let result = fetcher().await;
        self.track(service, started, result.is_ok());

        let value = result?;
        self.cache.set(key, &value, options);
        Ok(value)
    }

    fn track(&self, service: Option<&ServiceId>, started: Instant, success: bool) {
        let (Some(registry), Some(service)) = (&self.registry, service) else {
            return;
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Err(e) = registry.record_service_response(service, elapsed_ms, success) {
            tracing::debug!(error = %e, "Fetch not attributed to a registered service");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::config::RegistryConfig;
    use crate::registry::ManagedService;

    struct Stub;

    #[async_trait]
    impl ManagedService for Stub {}

    fn cached() -> CachedServices {
        CachedServices::new(Arc::new(CacheStore::in_memory(Duration::from_secs(60))))
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cached = cached();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec!["post-1".to_string()])
        };

        let first = cached.get_or_fetch("feed", fetch, Duration::from_secs(30)).await;
        let second = cached.get_or_fetch("feed", fetch, Duration::from_secs(30)).await;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cached = cached();
        let result: Result<u32, String> = cached
            .get_or_fetch("k", || async { Err("backend down".to_string()) }, Duration::from_secs(30))
            .await;
        assert!(result.is_err());
        assert!(!cached.cache().has("k"));
    }

    #[tokio::test]
    async fn test_expired_value_is_refetched() {
        let cached = cached();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let fetch = move || async move { Ok::<_, String>(counter.fetch_add(1, Ordering::SeqCst)) };

        cached.get_or_fetch("live", fetch, Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let value = cached.get_or_fetch("live", fetch, Duration::from_millis(20)).await.unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_fetches_are_recorded_on_registry() {
        let registry = Arc::new(ServiceRegistry::new(RegistryConfig::default()));
        registry.register_service(ServiceId::Posts, Arc::new(Stub), "1.0.0");
        let cached = cached().with_registry(registry.clone());

        let _: Result<u8, String> = cached
            .get_or_fetch_for(&ServiceId::Posts, "a", || async { Ok(1) }, Duration::from_secs(5))
            .await;
        let _: Result<u8, String> = cached
            .get_or_fetch_for(&ServiceId::Posts, "b", || async { Err("x".into()) }, Duration::from_secs(5))
            .await;
        // Cache hit: no new registry sample
        let _: Result<u8, String> = cached
            .get_or_fetch_for(&ServiceId::Posts, "a", || async { Ok(1) }, Duration::from_secs(5))
            .await;

        let metrics = registry.metrics(&ServiceId::Posts).unwrap();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.failed_requests, 1);
    }
}
