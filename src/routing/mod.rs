//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (path, query, body)
//!     → router.rs (path lookup, selector scan)
//!     → selector.rs (named key or always-match)
//!     → builders.rs (route-specific outbound Request)
//!     → router.rs (User-Agent, Accept, credential, Content-Type)
//!     → Return: prepared Request or DispatchError
//!
//! Route registration (at startup):
//!     register_default_routes(base_url)
//!     → RouteTable + AuthorizationExemptions
//!     → frozen inside the Dispatcher
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - Exact path match only
//! - Deterministic: same input always fires the same builder
//! - At most one builder fires per request

pub mod builders;
pub mod router;
pub mod selector;

pub use builders::{register_default_routes, DREAM_DOWNLOAD, DREAM_QUERY, FRIEND_REQUESTS};
pub use router::{AuthorizationExemptions, DispatchError, Dispatcher, Rejection, RouteBuilder, RouteTable};
pub use selector::Selector;
