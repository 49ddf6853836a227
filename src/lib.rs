//! Dream Relay Library
//!
//! A local HTTP relay in front of a credential-gated remote API. Callers
//! speak plain HTTP to the relay; each request path maps to a route whose
//! builder produces the outbound call, the relay attaches the bearer
//! credential, and the upstream reply is streamed back as it arrives.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;
pub mod transport;

pub use config::schema::RelayConfig;
pub use http::{PollOutcome, RelayServer};
pub use lifecycle::Shutdown;
pub use security::Credential;
