//! Thin pass-through wrapper for one backend area (users, posts, ...).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::registry::ManagedService;
use crate::transport::{TransportClient, TransportError};

/// CRUD access to a single REST collection, e.g. `/posts`.
///
/// Payload shapes are the caller's concern; everything is `serde_json::Value`.
#[derive(Debug, Clone)]
pub struct RestResource {
    transport: Arc<TransportClient>,
    base_path: String,
}

impl RestResource {
    pub fn new(transport: Arc<TransportClient>, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        Self {
            transport,
            base_path: format!("/{}", base_path.trim_matches('/')),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn path_for(&self, id: &str) -> String {
        format!("{}/{}", self.base_path, id)
    }

    pub async fn list(&self) -> Result<Value, TransportError> {
        self.transport.get(&self.base_path).await
    }

    pub async fn fetch(&self, id: &str) -> Result<Value, TransportError> {
        self.transport.get(&self.path_for(id)).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<Value, TransportError> {
        self.transport.post(&self.base_path, body).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<Value, TransportError> {
        self.transport.put(&self.path_for(id), body).await
    }

    pub async fn modify<B: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<Value, TransportError> {
        self.transport.patch(&self.path_for(id), body).await
    }

    pub async fn remove(&self, id: &str) -> Result<Value, TransportError> {
        self.transport.delete(&self.path_for(id)).await
    }

    /// GET a sub-path of this collection, e.g. `overview` under `/admin/analytics`.
    pub async fn get_sub(&self, sub_path: &str) -> Result<Value, TransportError> {
        self.transport.get(&self.path_for(sub_path.trim_start_matches('/'))).await
    }
}

#[async_trait]
impl ManagedService for RestResource {}
