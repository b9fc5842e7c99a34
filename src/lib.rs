//! Client-side service orchestration: transport, cache, registry and facades.

pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod facade;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod session;
pub mod storage;
pub mod transport;

pub use cache::CacheStore;
pub use config::schema::OrchestratorConfig;
pub use context::AppContext;
pub use lifecycle::Shutdown;
pub use registry::{ServiceId, ServiceRegistry};
pub use transport::TransportClient;
