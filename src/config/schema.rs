//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the orchestrator.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Error rate above which a service is marked degraded.
pub const ERROR_RATE_THRESHOLD: f64 = 0.1;

/// Interval between two health-check sweeps.
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

/// Root configuration for the orchestration layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Transport client settings (base URL, timeout, retries).
    pub transport: TransportConfig,

    /// Cache store settings.
    pub cache: CacheConfig,

    /// Service registry and health-check policy.
    pub registry: RegistryConfig,

    /// Credential persistence.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Transport client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL every request path is joined onto.
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Maximum number of attempts for a request that received no response.
    pub retry_attempts: u32,

    /// Base delay for backoff between attempts in milliseconds.
    pub retry_delay_ms: u64,

    /// Upper bound for the backoff delay in milliseconds.
    pub max_retry_delay_ms: u64,

    /// Path requested by the built-in transport health check.
    pub health_path: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_ms: 10_000,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            max_retry_delay_ms: 10_000,
            health_path: "/health".to_string(),
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Cache store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied when a write does not specify one, in seconds.
    pub default_ttl_secs: u64,

    /// Interval of the background expiry sweep, in seconds.
    pub cleanup_interval_secs: u64,

    /// Key prefix used for entries in the backing store.
    pub namespace: String,

    /// JSON file backing the cache. In-memory only when unset.
    pub persistence_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 300,
            cleanup_interval_secs: 300,
            namespace: "cache_".to_string(),
            persistence_path: None,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

/// Service registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Health check interval in seconds.
    pub health_check_interval_secs: u64,

    /// Timeout for a single service health check in seconds.
    pub health_check_timeout_secs: u64,

    /// Error rate above which a service transitions to `error`.
    pub error_rate_threshold: f64,

    /// Attempt recovery when an `error` service is looked up.
    pub recover_on_access: bool,

    /// Minimum time between two access-triggered recoveries of one service.
    pub recovery_cooldown_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            health_check_interval_secs: HEALTH_CHECK_INTERVAL_SECS,
            health_check_timeout_secs: 5,
            error_rate_threshold: ERROR_RATE_THRESHOLD,
            recover_on_access: true,
            recovery_cooldown_secs: 0,
        }
    }
}

impl RegistryConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }

    pub fn recovery_cooldown(&self) -> Duration {
        Duration::from_secs(self.recovery_cooldown_secs)
    }
}

/// Credential persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file holding durable credentials. In-memory only when unset.
    pub persistence_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the compact text format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
