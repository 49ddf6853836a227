//! Relay server: accept, frame, dispatch, stream, close.
//!
//! # Responsibilities
//! - Own the listening socket once started
//! - Serve at most one connection per `poll_once`, to completion
//! - Turn dispatch failures into bodiless `400`/`404` replies
//! - Drop connections that fail framing without a reply
//! - Record per-connection logs and metrics
//!
//! # Design Decisions
//! - Single-threaded: accept, read, dispatch and stream all run on the
//!   caller's task before the next readiness check
//! - `poll_once` errors only when there is no listening socket
//! - A failure while serving one connection never reaches the next one

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::config::RelayConfig;
use crate::http::parser::{parse_request, read_request, ReadLimits};
use crate::http::response::{BAD_REQUEST, NOT_FOUND};
use crate::net::{ConnectionId, ConnectionState, Listener, ListenerError};
use crate::observability::metrics;
use crate::resilience::BackoffPolicy;
use crate::routing::{register_default_routes, AuthorizationExemptions, DispatchError, Dispatcher, RouteTable};
use crate::security::Credential;
use crate::transport::{SinkWriter, Transport, TransportError};

/// Result of one `poll_once` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No connection was pending.
    Idle,
    /// One connection was accepted, served and closed.
    Served(ConnectionId),
}

/// The relay.
pub struct RelayServer {
    config: RelayConfig,
    dispatcher: Dispatcher,
    transport: Transport,
    policy: BackoffPolicy,
    limits: ReadLimits,
    listener: Option<Listener>,
}

impl RelayServer {
    /// Build a relay with the standard route table for `config.upstream`.
    pub fn new(config: RelayConfig, credential: Credential) -> Result<Self, TransportError> {
        let mut table = RouteTable::new();
        let mut exemptions = AuthorizationExemptions::new();
        register_default_routes(&mut table, &mut exemptions, &config.upstream.base_url);

        let dispatcher = Dispatcher::new(table, exemptions, config.upstream.user_agent.clone(), credential);
        Self::with_dispatcher(config, dispatcher)
    }

    /// Build a relay around a caller-assembled dispatcher.
    pub fn with_dispatcher(config: RelayConfig, dispatcher: Dispatcher) -> Result<Self, TransportError> {
        let transport = Transport::new(&config.timeouts, &config.transport)?;
        let policy = BackoffPolicy::from(&config.backpressure);
        let limits = ReadLimits {
            read_timeout: Duration::from_millis(config.listener.read_timeout_ms),
            max_request_bytes: config.listener.max_request_bytes,
        };

        tracing::debug!(
            routes = dispatcher.table().len(),
            debug = transport.is_debug(),
            "Relay constructed"
        );

        Ok(Self {
            config,
            dispatcher,
            transport,
            policy,
            limits,
            listener: None,
        })
    }

    /// Bind and listen on `port` (0 picks an ephemeral port).
    pub fn start(&mut self, port: u16) -> Result<SocketAddr, ListenerError> {
        let listener = Listener::bind(&self.config.listener, port)?;
        let addr = listener.local_addr();
        self.listener = Some(listener);
        tracing::info!(address = %addr, upstream = %self.config.upstream.base_url, "Relay started");
        Ok(addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(Listener::local_addr)
    }

    pub fn is_started(&self) -> bool {
        self.listener.is_some()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Accept and fully serve at most one pending connection.
    pub async fn poll_once(&self) -> Result<PollOutcome, ListenerError> {
        let listener = self.listener.as_ref().ok_or(ListenerError::NotStarted)?;

        let (stream, peer) = match listener.try_accept() {
            Ok(Some(accepted)) => accepted,
            Ok(None) => return Ok(PollOutcome::Idle),
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
                return Ok(PollOutcome::Idle);
            }
        };

        let id = ConnectionId::new();
        let span = tracing::info_span!("connection", id = %id, peer = %peer);
        self.serve_connection(stream).instrument(span).await;
        Ok(PollOutcome::Served(id))
    }

    async fn serve_connection(&self, mut stream: TcpStream) {
        let start = Instant::now();
        let mut state = ConnectionState::AwaitHeaders;

        let raw = match read_request(&mut stream, &self.limits, &mut state).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, state = %state, "Dropping connection without reply");
                metrics::record_request("-", "framing_error", start);
                close(stream, &mut state).await;
                return;
            }
        };

        let inbound = match parse_request(&raw) {
            Ok(inbound) => inbound,
            Err(e) => {
                tracing::debug!(error = %e, bytes = raw.len(), "Dropping connection without reply");
                metrics::record_request("-", "framing_error", start);
                close(stream, &mut state).await;
                return;
            }
        };

        enter(&mut state, ConnectionState::Dispatch);
        tracing::debug!(
            method = %inbound.method,
            route = %inbound.path,
            body_bytes = inbound.body.len(),
            "Request framed"
        );

        match self.dispatcher.resolve(&inbound.path, &inbound.query, &inbound.body) {
            Ok(request) => {
                enter(&mut state, ConnectionState::StreamReply);
                match self.transport.execute_streaming(&request, &mut stream, self.policy).await {
                    Ok(summary) => {
                        tracing::info!(
                            route = %inbound.path,
                            status = summary.upstream_status,
                            bytes = summary.body_bytes,
                            chunked = summary.chunked,
                            sink_retries = summary.sink_retries,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Relayed"
                        );
                        metrics::record_bytes(&inbound.path, summary.body_bytes);
                        metrics::record_request(&inbound.path, "relayed", start);
                    }
                    Err(e) => {
                        tracing::warn!(route = %inbound.path, error = %e, kind = e.kind(), "Relay failed");
                        metrics::record_request(&inbound.path, e.kind(), start);
                    }
                }
            }
            Err(err) => {
                let (reply, outcome, route) = match &err {
                    DispatchError::NotFound(_) => (NOT_FOUND, "not_found", "-"),
                    DispatchError::BadRequest(_) => (BAD_REQUEST, "bad_request", inbound.path.as_str()),
                };
                tracing::info!(route = %inbound.path, status = err.status_code(), reason = %err, "Request refused");

                let mut writer = SinkWriter::new(&mut stream, self.policy);
                if let Err(e) = writer.write_all(reply).await {
                    tracing::debug!(error = %e, "Failed to send refusal");
                }
                metrics::record_request(route, outcome, start);
            }
        }

        close(stream, &mut state).await;
    }

    /// Call `poll_once` every `tick` until `shutdown` fires.
    ///
    /// Every pending connection is served before waiting for the next tick.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>, tick: Duration) -> Result<(), ListenerError> {
        if !self.is_started() {
            return Err(ListenerError::NotStarted);
        }

        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, relay stopping");
                    break;
                }
                _ = ticker.tick() => {
                    while let PollOutcome::Served(_) = self.poll_once().await? {}
                }
            }
        }

        Ok(())
    }
}

fn enter(state: &mut ConnectionState, next: ConnectionState) {
    tracing::trace!(from = %state, to = %next, "Connection state");
    *state = next;
}

async fn close(mut stream: TcpStream, state: &mut ConnectionState) {
    if let Err(e) = stream.shutdown().await {
        tracing::trace!(error = %e, "Shutdown after serve failed");
    }
    enter(state, ConnectionState::Closed);
}
