//! Per-connection identity and state machine.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track where one accepted connection is in its lifecycle
//!
//! ```text
//! AwaitHeaders → AwaitBody(content_length) → Dispatch → StreamReply → Closed
//!       │                 │                      │
//!       └──── framing error ──────┘              └── 400 / 404 ──▶ Closed
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough: only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle of one inbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for `\r\n\r\n`.
    AwaitHeaders,
    /// Head seen; waiting for the declared body bytes.
    AwaitBody { content_length: usize },
    /// Request framed; resolving the route.
    Dispatch,
    /// Forwarding the upstream reply.
    StreamReply,
    /// Socket released.
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::AwaitHeaders => "await_headers",
            ConnectionState::AwaitBody { .. } => "await_body",
            ConnectionState::Dispatch => "dispatch",
            ConnectionState::StreamReply => "stream_reply",
            ConnectionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string(), format!("conn-{}", id.as_u64()));
    }

    #[test]
    fn state_names() {
        assert_eq!(ConnectionState::AwaitBody { content_length: 4 }.to_string(), "await_body");
        assert_eq!(ConnectionState::StreamReply.as_str(), "stream_reply");
    }
}
