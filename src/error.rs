//! Custom error types for the Tally secrets subsystem
//!
//! This module defines the error hierarchy for secrets and credential
//! operations using thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for Tally secrets operations
#[derive(Error, Debug)]
pub enum TallyError {
    /// Configuration-related errors (missing or misconfigured paths)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Encryption errors (cipher setup, encoding)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// AEAD authentication failure: tag mismatch, truncated input, or wrong key
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Asymmetric decryption failure, carrying the identity's own public key
    /// so an operator can diagnose recipient mismatches
    #[error("Decryption of '{path}' failed: {reason} (your public key: {public_key})")]
    Decryption {
        path: String,
        reason: String,
        public_key: String,
    },

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Interactive editor subprocess exited non-zero
    #[error("Editor '{editor}' exited with status {status}")]
    Editor { editor: String, status: i32 },

    /// Credential storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TallyError {
    /// Create a "not found" error for credentials
    pub fn credential_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Credential",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for secrets bundle keys
    pub fn secret_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Secret",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an AEAD authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Tally secrets operations
pub type TallyResult<T> = Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TallyError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = TallyError::credential_not_found("u1/gringotts");
        assert_eq!(err.to_string(), "Credential not found: u1/gringotts");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_decryption_error_mentions_public_key() {
        let err = TallyError::Decryption {
            path: "config/secrets/prod.enc.json".into(),
            reason: "file is not encrypted to any identity you hold".into(),
            public_key: "ab12cd34".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("prod.enc.json"));
        assert!(msg.contains("ab12cd34"));
    }

    #[test]
    fn test_editor_error() {
        let err = TallyError::Editor {
            editor: "vi".into(),
            status: 1,
        };
        assert_eq!(err.to_string(), "Editor 'vi' exited with status 1");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let tally_err: TallyError = io_err.into();
        assert!(matches!(tally_err, TallyError::Io(_)));
    }
}
