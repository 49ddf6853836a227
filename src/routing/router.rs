//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store route path → ordered (selector, builder) entries
//! - Pick at most one builder per inbound request
//! - Prepare the built request (identity headers, credential, content type)
//!
//! # Design Decisions
//! - Immutable after startup; lookups take `&self`
//! - O(1) path lookup via HashMap, O(n) selector scan per path
//! - Named selectors are tried before always-match ones, each group in
//!   registration order
//! - A builder that panics fails only its own request

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;

use crate::http::params::QueryParams;
use crate::http::request::Request;
use crate::routing::selector::Selector;
use crate::security::Credential;

/// A builder refused the inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection(pub String);

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a request could not be turned into an outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("No route registered for {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl DispatchError {
    /// Status line answered to the inbound client.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::NotFound(_) => 404,
            DispatchError::BadRequest(_) => 400,
        }
    }
}

/// Turns an inbound body and query into an outbound request.
pub trait RouteBuilder: Send + Sync {
    fn build(&self, body: &[u8], query: &QueryParams) -> Result<Request, Rejection>;
}

impl<F> RouteBuilder for F
where
    F: Fn(&[u8], &QueryParams) -> Result<Request, Rejection> + Send + Sync,
{
    fn build(&self, body: &[u8], query: &QueryParams) -> Result<Request, Rejection> {
        self(body, query)
    }
}

struct RouteEntry {
    selector: Selector,
    builder: Box<dyn RouteBuilder>,
}

/// Route path → ordered builders.
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, Vec<RouteEntry>>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (path, entries) in &self.routes {
            let selectors: Vec<String> = entries.iter().map(|e| e.selector.to_string()).collect();
            map.entry(path, &selectors);
        }
        map.finish()
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a builder for `path`. `"default"` or `""` registers an always-match selector.
    pub fn register<B>(&mut self, path: impl Into<String>, selector: impl Into<Selector>, builder: B)
    where
        B: RouteBuilder + 'static,
    {
        self.routes.entry(path.into()).or_default().push(RouteEntry {
            selector: selector.into(),
            builder: Box::new(builder),
        });
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The builder that fires for `query` on `path`, with its selector.
    pub fn lookup(&self, path: &str, query: &QueryParams) -> Result<(&Selector, &dyn RouteBuilder), DispatchError> {
        let entries = self
            .routes
            .get(path)
            .ok_or_else(|| DispatchError::NotFound(path.to_string()))?;

        let named = entries.iter().filter(|e| !e.selector.is_always());
        let fallback = entries.iter().filter(|e| e.selector.is_always());

        named
            .chain(fallback)
            .find(|e| e.selector.matches(query))
            .map(|e| (&e.selector, e.builder.as_ref()))
            .ok_or_else(|| DispatchError::BadRequest(format!("no selector of {} matched", path)))
    }
}

/// Routes that must not carry the credential.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationExemptions {
    routes: HashMap<String, bool>,
}

impl AuthorizationExemptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, exempt: bool) {
        self.routes.insert(path.into(), exempt);
    }

    /// Absent means the credential is injected.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.routes.get(path).copied().unwrap_or(false)
    }
}

/// Resolves inbound requests into prepared outbound ones.
#[derive(Debug)]
pub struct Dispatcher {
    table: RouteTable,
    exemptions: AuthorizationExemptions,
    user_agent: String,
    credential: Credential,
}

impl Dispatcher {
    pub fn new(
        table: RouteTable,
        exemptions: AuthorizationExemptions,
        user_agent: impl Into<String>,
        credential: Credential,
    ) -> Self {
        Self {
            table,
            exemptions,
            user_agent: user_agent.into(),
            credential,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Select a builder, run it, and prepare its output.
    pub fn resolve(&self, path: &str, query: &QueryParams, body: &[u8]) -> Result<Request, DispatchError> {
        let (selector, builder) = self.table.lookup(path, query)?;

        let built = catch_unwind(AssertUnwindSafe(|| builder.build(body, query)));
        let mut request = match built {
            Ok(Ok(request)) => request,
            Ok(Err(rejection)) => {
                tracing::debug!(route = path, %selector, reason = %rejection, "Builder rejected request");
                return Err(DispatchError::BadRequest(rejection.0));
            }
            Err(_) => {
                tracing::error!(route = path, %selector, "Builder panicked");
                return Err(DispatchError::BadRequest("builder failed".to_string()));
            }
        };

        self.prepare(path, &mut request);
        Ok(request)
    }

    fn prepare(&self, path: &str, request: &mut Request) {
        request.set_header("User-Agent", self.user_agent.as_str());
        request.set_header("Accept", "*/*");
        if !self.exemptions.is_exempt(path) {
            request.set_header("Authorization", self.credential.bearer());
        }
        request.apply_mime_type();
    }
}
