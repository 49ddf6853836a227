//! Bearer credential handed to the relay at construction.
//!
//! # Design Decisions
//! - Never empty once constructed
//! - `Debug` never prints the secret
//! - Loaded once; the relay does not refresh it

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable consulted when no token file is given.
pub const TOKEN_ENV_VAR: &str = "DREAM_RELAY_TOKEN";

/// Errors while obtaining a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential is empty")]
    Empty,

    #[error("Failed to read credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// A non-empty bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Trailing NUL bytes and surrounding whitespace are stripped first.
    pub fn new(raw: impl Into<String>) -> Result<Self, CredentialError> {
        let raw = raw.into();
        let token = raw
            .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
            .trim_start();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(token.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, CredentialError> {
        let bytes = std::fs::read(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(String::from_utf8_lossy(&bytes))
    }

    pub fn from_env() -> Result<Self, CredentialError> {
        let raw = std::env::var(TOKEN_ENV_VAR).map_err(|_| CredentialError::MissingEnv(TOKEN_ENV_VAR))?;
        Self::new(raw)
    }

    /// The raw token. Only the dispatcher should need this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>`
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn trims_nul_and_whitespace() {
        let cred = Credential::new("abc123\0\0\n").unwrap();
        assert_eq!(cred.expose(), "abc123");
        assert_eq!(cred.bearer(), "Bearer abc123");
    }

    #[test]
    fn empty_is_refused() {
        assert!(matches!(Credential::new(""), Err(CredentialError::Empty)));
        assert!(matches!(Credential::new(" \0\r\n"), Err(CredentialError::Empty)));
    }

    #[test]
    fn debug_is_redacted() {
        let cred = Credential::new("topsecret").unwrap();
        let printed = format!("{:?}", cred);
        assert!(!printed.contains("topsecret"));
    }

    #[test]
    fn reads_from_file() {
        let path = std::env::temp_dir().join(format!("dream-relay-token-{}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"file-token\0").unwrap();
        drop(file);

        let cred = Credential::from_file(&path).unwrap();
        assert_eq!(cred.expose(), "file-token");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Credential::from_file(Path::new("/nonexistent/dream-relay/token")).unwrap_err();
        assert!(matches!(err, CredentialError::Io { .. }));
    }
}
