//! Transport error definitions.

use thiserror::Error;

/// Errors that end an outbound execution.
///
/// HTTP error statuses from the origin are not errors; they come back as a
/// `Reply` (buffered) or are relayed (streaming).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The outbound client could not be constructed.
    #[error("Client setup failed: {0}")]
    Client(String),

    /// Connection, DNS or TLS setup failed.
    #[error("Connection error: {0}")]
    Connect(String),

    /// Connect or transfer timeout exceeded.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The request could not be turned into a valid HTTP request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The exchange failed after the connection was established.
    #[error("Upstream error: {0}")]
    Upstream(reqwest::Error),

    /// The inbound peer went away (broken pipe, reset, zero-length write).
    #[error("Inbound connection closed by peer")]
    SinkClosed,

    /// The inbound peer stayed unwritable for too long.
    #[error("Inbound connection not writable after {attempts} attempts")]
    Backpressure { attempts: u32 },

    /// Any other write failure on the inbound socket.
    #[error("Inbound write failed: {0}")]
    Sink(std::io::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Upstream(err)
        }
    }
}

impl TransportError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Client(_) => "client",
            TransportError::Connect(_) => "connect",
            TransportError::Timeout(_) => "timeout",
            TransportError::InvalidRequest(_) => "invalid_request",
            TransportError::Upstream(_) => "upstream",
            TransportError::SinkClosed => "sink_closed",
            TransportError::Backpressure { .. } => "backpressure",
            TransportError::Sink(_) => "sink",
        }
    }
}
