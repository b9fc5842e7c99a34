//! Analytics backend collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::registry::ManagedService;
use crate::transport::{RestResource, TransportClient, TransportError};

/// Source of the data a dashboard aggregates.
///
/// Each call resolves to the unwrapped `data` of the backend envelope.
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn overview(&self) -> Result<Value, TransportError>;

    async fn revenue(&self, period: &str) -> Result<Value, TransportError>;

    async fn user_growth(&self, period: &str) -> Result<Value, TransportError>;

    async fn realtime(&self) -> Result<Value, TransportError>;
}

/// [`AnalyticsApi`] served by the REST backend under `/admin/analytics`.
#[derive(Debug, Clone)]
pub struct HttpAnalyticsApi {
    resource: RestResource,
}

impl HttpAnalyticsApi {
    pub const BASE_PATH: &'static str = "/admin/analytics";

    pub fn new(transport: Arc<TransportClient>) -> Self {
        Self {
            resource: RestResource::new(transport, Self::BASE_PATH),
        }
    }
}

#[async_trait]
impl AnalyticsApi for HttpAnalyticsApi {
    async fn overview(&self) -> Result<Value, TransportError> {
        self.resource.get_sub("overview").await
    }

    async fn revenue(&self, period: &str) -> Result<Value, TransportError> {
        self.resource.get_sub(&format!("revenue?period={period}")).await
    }

    async fn user_growth(&self, period: &str) -> Result<Value, TransportError> {
        self.resource.get_sub(&format!("user-growth?period={period}")).await
    }

    async fn realtime(&self) -> Result<Value, TransportError> {
        self.resource.get_sub("realtime").await
    }
}

#[async_trait]
impl ManagedService for HttpAnalyticsApi {}
