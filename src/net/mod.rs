//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! poll_once()
//!     → listener.rs (zero-timeout accept)
//!     → connection.rs (connection ID, state machine)
//!     → Hand off to http::server for framing, dispatch and reply
//! ```
//!
//! # Design Decisions
//! - Plaintext only; inbound traffic is local and trusted
//! - One connection is served to completion before the next accept

pub mod connection;
pub mod listener;

pub use connection::{ConnectionId, ConnectionState};
pub use listener::{Listener, ListenerError};
