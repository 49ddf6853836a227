//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Fixed remote origin every route forwards to.
pub const DEFAULT_BASE_URL: &str = "https://api.hac.lp1.acbaa.srv.nintendo.net";

/// User agent presented to the remote origin.
pub const DEFAULT_USER_AGENT: &str = "libcurl/7.64.1 (HAC; nnEns; SDK 20.5.4.0)";

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Inbound listener settings.
    pub listener: ListenerConfig,

    /// Remote origin settings.
    pub upstream: UpstreamConfig,

    /// Outbound timeouts.
    pub timeouts: TimeoutConfig,

    /// Outbound client settings.
    pub transport: TransportConfig,

    /// Retry policy for writes the inbound socket is not ready for.
    pub backpressure: BackpressureConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind IP (e.g., "0.0.0.0").
    pub bind_address: String,

    /// Port used when none is given on the command line.
    pub port: u16,

    /// OS listen backlog.
    pub backlog: u32,

    /// Maximum wait for any single inbound read, in milliseconds.
    pub read_timeout_ms: u64,

    /// Maximum inbound request size (head plus body).
    pub max_request_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            backlog: 10,
            read_timeout_ms: 1000,
            max_request_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Remote origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin of the remote API, without trailing slash.
    pub base_url: String,

    /// `User-Agent` sent on every outbound request.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Whole exchange timeout (request and full response body) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            request_secs: 300,
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TCP keep-alive idle time in seconds.
    pub tcp_keepalive_secs: u64,

    /// Idle pooled connections kept per host.
    pub max_idle_per_host: usize,

    /// Dump what would be sent instead of contacting the origin.
    pub debug: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tcp_keepalive_secs: 120,
            max_idle_per_host: 10,
            debug: false,
        }
    }
}

/// Backoff policy for would-block writes to the inbound socket.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackpressureConfig {
    /// Consecutive would-block attempts tolerated before giving up.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            base_delay_ms: 1,
            max_delay_ms: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
