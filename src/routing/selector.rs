//! Builder selectors.
//!
//! # Design Decisions
//! - A named selector matches when the inbound query carries that key
//! - `"default"` and `""` match everything
//! - Matching is exact and case-sensitive

use crate::http::params::QueryParams;

/// Condition under which a route builder fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Matches when the query contains this key.
    Param(String),
    /// Always matches.
    Always,
}

impl Selector {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | "default" => Selector::Always,
            name => Selector::Param(name.to_string()),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Selector::Always)
    }

    pub fn matches(&self, query: &QueryParams) -> bool {
        match self {
            Selector::Param(name) => query.contains_key(name),
            Selector::Always => true,
        }
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Selector::parse(raw)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Param(name) => f.write_str(name),
            Selector::Always => f.write_str("default"),
        }
    }
}
