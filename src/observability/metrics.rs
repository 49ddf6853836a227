//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define relay metrics (requests, latency, forwarded bytes, backpressure)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `relay_requests_total` (counter): served connections by route, outcome
//! - `relay_request_duration_seconds` (histogram): accept-to-close latency
//! - `relay_bytes_forwarded_total` (counter): body bytes relayed by route
//! - `relay_sink_retries_total` (counter): would-block retries on inbound sockets
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Labels stay low-cardinality: route path and outcome only

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// One served inbound connection.
pub fn record_request(route: &str, outcome: &str, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "route" => route.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "relay_request_duration_seconds",
        "route" => route.to_string(),
        "outcome" => outcome.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_bytes(route: &str, bytes: u64) {
    metrics::counter!("relay_bytes_forwarded_total", "route" => route.to_string()).increment(bytes);
}

pub fn record_sink_retry() {
    metrics::counter!("relay_sink_retries_total").increment(1);
}
