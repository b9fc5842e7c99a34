//! Service identity and the lifecycle contract registered services fulfil.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type returned by service hooks.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Known services, plus an escape hatch for dynamically added ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceId {
    /// The transport client itself.
    Api,
    Auth,
    Users,
    Posts,
    Notifications,
    Admin,
    Analytics,
    /// A service registered at runtime under an arbitrary name.
    Plugin(String),
}

impl ServiceId {
    /// Every built-in service, in boot order.
    pub const BUILTIN: [ServiceId; 7] = [
        ServiceId::Api,
        ServiceId::Auth,
        ServiceId::Users,
        ServiceId::Posts,
        ServiceId::Notifications,
        ServiceId::Admin,
        ServiceId::Analytics,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ServiceId::Api => "api",
            ServiceId::Auth => "auth",
            ServiceId::Users => "users",
            ServiceId::Posts => "posts",
            ServiceId::Notifications => "notifications",
            ServiceId::Admin => "admin",
            ServiceId::Analytics => "analytics",
            ServiceId::Plugin(name) => name,
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hooks the registry drives. Every hook is optional.
///
/// A service without its own health check is considered healthy whenever
/// it is checked.
#[async_trait]
pub trait ManagedService: Send + Sync + 'static {
    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn start(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
