//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP connection
//!     → parser.rs (frame head and body, split path and query)
//!     → server.rs (dispatch, then stream the reply or refuse)
//!     → request.rs (outbound request model built by routes)
//!     → response.rs (relay head, canned refusals, buffered Reply)
//!     → Close
//! ```

pub mod params;
pub mod parser;
pub mod request;
pub mod response;
pub mod server;

pub use params::{HeaderFields, QueryParams};
pub use parser::{FramingError, InboundRequest};
pub use request::{Method, MimeType, Request};
pub use response::Reply;
pub use server::{PollOutcome, RelayServer};
