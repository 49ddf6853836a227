//! Security subsystem.
//!
//! # Design Decisions
//! - The bearer credential is injected by the dispatcher, never by callers
//! - Routes that must not carry it are listed explicitly
//! - Secrets never reach logs

pub mod credential;

pub use credential::{Credential, CredentialError, TOKEN_ENV_VAR};
