//! Resilience subsystem.
//!
//! # Responsibilities
//! - Bounded exponential backoff for writes the inbound socket cannot take yet
//!
//! # Design Decisions
//! - Outbound failures are never retried here; retry policy belongs to the caller
//! - Every wait loop has an attempt bound, never an unbounded spin

pub mod backoff;

pub use backoff::{calculate_backoff, BackoffPolicy};
