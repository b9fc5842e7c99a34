//! Partial-failure-tolerant dashboard aggregation.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::clock::now_millis;
use crate::facade::analytics::AnalyticsApi;
use crate::facade::cached::CachedServices;
use crate::facade::policy::CachePolicy;
use crate::registry::ServiceId;
use crate::transport::TransportError;

const DEFAULT_PERIOD: &str = "30d";

/// One dashboard load. A `None` slot means that source failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub overview: Option<Value>,
    pub revenue: Option<Value>,
    pub user_growth: Option<Value>,
    pub realtime: Option<Value>,
    /// Unix millis when the aggregate resolved.
    pub fetched_at: u64,
}

impl DashboardSnapshot {
    /// Names of the slots whose source failed.
    pub fn failed_sources(&self) -> Vec<&'static str> {
        [
            ("overview", &self.overview),
            ("revenue", &self.revenue),
            ("user_growth", &self.user_growth),
            ("realtime", &self.realtime),
        ]
        .into_iter()
        .filter(|(_, slot)| slot.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_sources().is_empty()
    }
}

/// Fetches every dashboard source concurrently through the cache.
pub struct DashboardAggregator {
    cached: CachedServices,
    api: Arc<dyn AnalyticsApi>,
    period: String,
}

impl DashboardAggregator {
    pub fn new(cached: CachedServices, api: Arc<dyn AnalyticsApi>) -> Self {
        Self {
            cached,
            api,
            period: DEFAULT_PERIOD.to_string(),
        }
    }

    /// Reporting window passed to period-scoped sources, e.g. `7d`.
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    /// Load all sources. Never fails; failed sources become `None`.
    pub async fn fetch(&self) -> DashboardSnapshot {
        let period = self.period.as_str();
        let revenue_key = format!("analytics:revenue:{period}");
        let growth_key = format!("analytics:user_growth:{period}");

        let (overview, revenue, user_growth, realtime) = tokio::join!(
            self.load("analytics:overview", CachePolicy::OVERVIEW, || self.api.overview()),
            self.load(&revenue_key, CachePolicy::REVENUE, || self.api.revenue(period)),
            self.load(&growth_key, CachePolicy::USER_GROWTH, || self.api.user_growth(period)),
            self.load("analytics:realtime", CachePolicy::REALTIME, || self.api.realtime()),
        );

        let snapshot = DashboardSnapshot {
            overview,
            revenue,
            user_growth,
            realtime,
            fetched_at: now_millis(),
        };
        if !snapshot.is_complete() {
            tracing::warn!(
                failed = ?snapshot.failed_sources(),
                "Dashboard resolved with missing sources"
            );
        }
        snapshot
    }

    /// Evict cached revenue data for every period.
    pub fn invalidate_revenue(&self) -> usize {
        self.cached.invalidate("revenue")
    }

    async fn load<F, Fut>(&self, key: &str, policy: CachePolicy, fetcher: F) -> Option<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, TransportError>>,
    {
        match self
            .cached
            .get_or_fetch_for(&ServiceId::Analytics, key, fetcher, policy)
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Dashboard source failed");
                None
            }
        }
    }
}
