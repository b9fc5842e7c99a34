//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, threshold within (0, 1])
//! - Check the base URL is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OrchestratorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::OrchestratorConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.transport.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "transport.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("transport.base_url", e.to_string())),
    }

    if config.transport.timeout_ms == 0 {
        errors.push(ValidationError::new("transport.timeout_ms", "must be greater than 0"));
    }
    if config.transport.retry_attempts == 0 {
        errors.push(ValidationError::new("transport.retry_attempts", "must be at least 1"));
    }
    if config.transport.max_retry_delay_ms < config.transport.retry_delay_ms {
        errors.push(ValidationError::new(
            "transport.max_retry_delay_ms",
            "must not be smaller than retry_delay_ms",
        ));
    }

    if config.cache.default_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.default_ttl_secs", "must be greater than 0"));
    }
    if config.cache.cleanup_interval_secs == 0 {
        errors.push(ValidationError::new("cache.cleanup_interval_secs", "must be greater than 0"));
    }
    let shared_file = config.cache.persistence_path.is_some()
        && config.cache.persistence_path == config.session.persistence_path;
    if shared_file && config.cache.namespace.is_empty() {
        errors.push(ValidationError::new(
            "cache.namespace",
            "must not be empty when the cache shares the session's persistence_path",
        ));
    }

    let threshold = config.registry.error_rate_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        errors.push(ValidationError::new(
            "registry.error_rate_threshold",
            format!("{} is outside (0, 1]", threshold),
        ));
    }
    if config.registry.health_check_interval_secs == 0 {
        errors.push(ValidationError::new(
            "registry.health_check_interval_secs",
            "must be greater than 0",
        ));
    }
    if config.registry.health_check_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "registry.health_check_timeout_secs",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&OrchestratorConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = OrchestratorConfig::default();
        config.transport.base_url = "ftp://files.example.com".into();
        config.transport.retry_attempts = 0;
        config.registry.error_rate_threshold = 1.5;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "transport.base_url",
                "transport.retry_attempts",
                "registry.error_rate_threshold"
            ]
        );
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let mut config = OrchestratorConfig::default();
        config.transport.base_url = "/api".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "transport.base_url");
    }

    #[test]
    fn test_shared_file_needs_namespace() {
        let mut config = OrchestratorConfig::default();
        config.cache.persistence_path = Some("/tmp/state.json".into());
        config.session.persistence_path = Some("/tmp/state.json".into());
        assert!(validate_config(&config).is_ok());

        config.cache.namespace.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "cache.namespace");
    }
}
