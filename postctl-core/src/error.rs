//! Structured error types for postctl-core.
//!
//! Uses `thiserror` so hosts can match on the failure class.
//! The CLI wraps these in `anyhow` for reporting.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::frontmatter::FrontmatterError;

/// Main error type for store and upload operations
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied input is unusable (blank title, empty upload, bad identifier)
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// No record file exists for the identifier
    #[error("Record not found: {identifier}")]
    NotFound { identifier: String },

    /// The record file exists but its front matter cannot be decoded
    #[error("Malformed record {identifier}: {source}")]
    MalformedRecord {
        identifier: String,
        #[source]
        source: FrontmatterError,
    },

    /// Underlying file-system failure
    #[error("Storage error at {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for postctl-core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create a malformed-record error
    pub fn malformed(identifier: impl Into<String>, source: FrontmatterError) -> Self {
        Self::MalformedRecord {
            identifier: identifier.into(),
            source,
        }
    }

    /// Create a storage error for a path
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("title", "must not be blank");
        assert_eq!(err.to_string(), "Invalid title: must not be blank");

        let err = Error::not_found("2024-01-15-hello.md");
        assert_eq!(err.to_string(), "Record not found: 2024-01-15-hello.md");
    }

    #[test]
    fn test_malformed_keeps_source() {
        let err = Error::malformed("broken.md", FrontmatterError::Unclosed);
        assert!(err.is_malformed());
        assert!(err.to_string().contains("broken.md"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_storage_error_mentions_path() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = Error::storage("/tmp/posts", io_err);

        assert!(matches!(err, Error::Storage { .. }));
        assert!(err.to_string().contains("/tmp/posts"));
    }
}
