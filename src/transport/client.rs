//! Outbound HTTP client.
//!
//! # Responsibilities
//! - Own the shared connection-reuse handle (pool, DNS cache, TLS sessions)
//! - Execute a [`Request`] buffered into a [`Reply`]
//! - Execute a [`Request`] streamed straight into a [`ReplySink`]
//!
//! # Design Decisions
//! - One `reqwest::Client` per relay; clones share the same pool
//! - Buffered and streaming execution are separate entry points
//! - Origin error statuses are data, not errors

use std::time::{Duration, Instant};

use crate::config::{TimeoutConfig, TransportConfig};
use crate::http::params::HeaderFields;
use crate::http::request::{Method, Request};
use crate::http::response::Reply;
use crate::resilience::BackoffPolicy;
use crate::transport::debug;
use crate::transport::sink::{ReplySink, SinkWriter};
use crate::transport::stream::StreamContext;
use crate::transport::TransportError;

/// Outcome of a streamed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Status the origin answered with; the debug status in debug mode.
    pub upstream_status: u16,
    /// Body payload bytes relayed.
    pub body_bytes: u64,
    /// Whether the body was re-framed as chunked.
    pub chunked: bool,
    /// Would-block retries spent on the inbound socket.
    pub sink_retries: u64,
}

/// Shared outbound transport.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    debug: bool,
}

impl Transport {
    /// Build the shared client from timeout and transport settings.
    pub fn new(timeouts: &TimeoutConfig, config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .tcp_keepalive(Duration::from_secs(config.tcp_keepalive_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            debug: config.debug,
        })
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    fn prepare(&self, request: &Request) -> reqwest::RequestBuilder {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self.client.request(method, request.build_url_with_params());
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if request.method().carries_body() {
            builder = builder.body(request.body().to_vec());
        }
        builder
    }

    /// Perform the exchange and buffer the whole reply.
    pub async fn execute(&self, request: &Request) -> Result<Reply, TransportError> {
        if self.debug {
            let dump = debug::render_dump(request, Instant::now());
            return Ok(Reply {
                headers: HeaderFields::new(),
                body: dump.into_bytes(),
                status_code: debug::DEBUG_STATUS,
            });
        }

        let response = self.prepare(request).send().await?;
        let status_code = response.status().as_u16();

        // HeaderMap yields lowercased names grouped by first arrival; repeats keep the last value.
        let mut headers = HeaderFields::new();
        for (name, value) in response.headers() {
            headers.set(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }

        let body = response.bytes().await?.to_vec();
        tracing::debug!(status = status_code, bytes = body.len(), "Buffered exchange complete");

        Ok(Reply {
            headers,
            body,
            status_code,
        })
    }

    /// Perform the exchange and relay the reply into `sink` as it arrives.
    ///
    /// On error the sink may hold a partial reply; the caller closes it.
    pub async fn execute_streaming<S: ReplySink + ?Sized>(
        &self,
        request: &Request,
        sink: &mut S,
        policy: BackoffPolicy,
    ) -> Result<StreamSummary, TransportError> {
        let mut writer = SinkWriter::new(sink, policy);

        if self.debug {
            let dump = debug::render_dump(request, Instant::now());
            writer.write_all(debug::stream_head(dump.len()).as_bytes()).await?;
            writer.write_all(dump.as_bytes()).await?;
            return Ok(StreamSummary {
                upstream_status: debug::DEBUG_STATUS,
                body_bytes: dump.len() as u64,
                chunked: false,
                sink_retries: writer.retries(),
            });
        }

        let mut response = self.prepare(request).send().await?;
        let upstream_status = response.status().as_u16();

        let mut ctx = StreamContext::new();
        for (name, value) in response.headers() {
            ctx.observe_header(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
        ctx.flush_head(&mut writer).await?;

        while let Some(chunk) = response.chunk().await? {
            ctx.forward(&chunk, &mut writer).await?;
        }
        ctx.finish(&mut writer).await?;

        tracing::debug!(
            status = upstream_status,
            bytes = ctx.body_bytes(),
            chunked = ctx.is_chunked(),
            "Streamed exchange complete"
        );

        Ok(StreamSummary {
            upstream_status,
            body_bytes: ctx.body_bytes(),
            chunked: ctx.is_chunked(),
            sink_retries: writer.retries(),
        })
    }
}
