//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, retry bounds, limits)
//! - Check the upstream origin is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>

use std::net::{IpAddr, SocketAddr};

use url::Url;

use crate::config::schema::RelayConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint of `config`.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not an IP address: {:?}", config.listener.bind_address),
        ));
    }
    if config.listener.backlog == 0 {
        errors.push(ValidationError::new("listener.backlog", "must be > 0"));
    }
    if config.listener.read_timeout_ms == 0 {
        errors.push(ValidationError::new("listener.read_timeout_ms", "must be > 0"));
    }
    if config.listener.max_request_bytes == 0 {
        errors.push(ValidationError::new("listener.max_request_bytes", "must be > 0"));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https") {
                errors.push(ValidationError::new(
                    "upstream.base_url",
                    format!("unsupported scheme {:?}", url.scheme()),
                ));
            }
            if url.host_str().is_none() {
                errors.push(ValidationError::new("upstream.base_url", "missing host"));
            }
        }
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }
    if config.upstream.base_url.ends_with('/') {
        errors.push(ValidationError::new(
            "upstream.base_url",
            "must not end with '/'",
        ));
    }
    if config.upstream.user_agent.is_empty() {
        errors.push(ValidationError::new("upstream.user_agent", "must not be empty"));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.backpressure.max_attempts == 0 {
        errors.push(ValidationError::new("backpressure.max_attempts", "must be > 0"));
    }
    if config.backpressure.base_delay_ms > config.backpressure.max_delay_ms {
        errors.push(ValidationError::new(
            "backpressure.base_delay_ms",
            "must not exceed max_delay_ms",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
