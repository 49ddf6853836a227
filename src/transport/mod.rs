//! Outbound transport subsystem.
//!
//! # Data Flow
//! ```text
//! Request (from a route builder)
//!     → client.rs (shared reqwest client, buffered or streaming)
//!     → stream.rs (synthesized head, length or chunked framing)
//!     → sink.rs (non-blocking writes with bounded backoff)
//!     → inbound socket
//! ```
//!
//! In debug mode `debug.rs` replaces the exchange with a request dump.

pub mod client;
pub mod debug;
pub mod error;
pub mod sink;
pub mod stream;

pub use client::{StreamSummary, Transport};
pub use error::TransportError;
pub use sink::{ReplySink, SinkWriter};
pub use stream::StreamContext;
