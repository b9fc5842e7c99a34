//! HTTP transport client with credential injection and retries.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::config::TransportConfig;
use crate::observability::metrics;
use crate::registry::{ManagedService, ServiceError};
use crate::resilience::RetryContext;
use crate::session::{CredentialStore, LoginNavigator};
use crate::transport::envelope::{error_message, unwrap_body, Unwrapped};
use crate::transport::error::TransportError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Executes backend calls on behalf of every domain service.
pub struct TransportClient {
    http: Client,
    base_url: String,
    config: TransportConfig,
    credentials: Arc<CredentialStore>,
    navigator: Arc<dyn LoginNavigator>,
}

impl TransportClient {
    /// Create a client for `config.base_url`.
    pub fn new(
        config: TransportConfig,
        credentials: Arc<CredentialStore>,
        navigator: Arc<dyn LoginNavigator>,
    ) -> Result<Self, TransportError> {
        // Fail early on a malformed base URL rather than on first request
        Url::parse(&config.base_url)?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(TransportError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
            credentials,
            navigator,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.request(Method::DELETE, path, None).await
    }

    /// Issue a request and decode the unwrapped body into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, TransportError> {
        let value = self.execute(method, path, body).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Check the backend health endpoint once, without retries.
    pub async fn ping(&self) -> Result<(), TransportError> {
        let url = self.url_for(&self.config.health_path)?;
        let response = self
            .http
            .get(url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(TransportError::Network)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Domain {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("health check failed").to_string(),
            })
        }
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Ok(Url::parse(&joined)?)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let url = self.url_for(path)?;
        let request_id = Uuid::new_v4().to_string();
        let mut retry = RetryContext::from_config(&self.config);

        loop {
            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .header(REQUEST_ID_HEADER, &request_id);
            if let Some(token) = self.credentials.access_token() {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            let started = Instant::now();
            match builder.send().await {
                Ok(response) => {
                    let outcome = outcome_label(response.status());
                    metrics::record_transport_request(method.as_str(), outcome, started.elapsed());
                    return self.handle_response(response).await;
                }
                Err(e) => {
                    metrics::record_transport_request(method.as_str(), "network_error", started.elapsed());
                    let err = TransportError::Network(e);
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    match retry.next_delay() {
                        Some(delay) => {
                            tracing::warn!(
                                method = %method,
                                url = %url,
                                request_id = %request_id,
                                attempt = retry.attempt(),
                                max_attempts = retry.max_attempts(),
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "Request failed without response, retrying"
                            );
                            metrics::record_retry();
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            tracing::error!(
                                method = %method,
                                url = %url,
                                request_id = %request_id,
                                attempts = retry.attempt(),
                                error = %err,
                                "Request failed, retries exhausted"
                            );
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    async fn handle_response(&self, response: Response) -> Result<Value, TransportError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "Unauthenticated response, clearing session");
            self.credentials.clear();
            self.navigator.redirect_to_login();
            metrics::record_auth_redirect();
            return Err(TransportError::Authentication);
        }

        let bytes = response.bytes().await.map_err(TransportError::Network)?;

        if !status.is_success() {
            let message = error_message(&bytes).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("request failed").to_string()
            });
            tracing::debug!(status = status.as_u16(), message = %message, "Backend returned error status");
            return Err(TransportError::Domain {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        let body: Value =
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))?;

        match unwrap_body(body) {
            Unwrapped::Data(data) => Ok(data),
            Unwrapped::Failure(message) => Err(TransportError::Domain {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| "request was not successful".to_string()),
            }),
        }
    }
}

#[async_trait]
impl ManagedService for TransportClient {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.ping().await.map_err(Into::into)
    }
}

impl std::fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClient")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.config.timeout_ms)
            .field("retry_attempts", &self.config.retry_attempts)
            .finish()
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, TransportError> {
    serde_json::to_value(body).map_err(|e| TransportError::Encode(e.to_string()))
}

fn outcome_label(status: StatusCode) -> &'static str {
    if status.is_success() {
        "success"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "server_error"
    }
}
