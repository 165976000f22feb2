// src/error.rs
// Standardized error types for the local directory service

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the local directory service.
///
/// Every failure a tool can surface maps onto one of these variants, so
/// callers can branch on kind instead of parsing message strings.
#[derive(Error, Debug)]
pub enum LocalDirError {
    #[error("access denied: path '{}' is not in allowed directories", .0.display())]
    AccessDenied(PathBuf),

    #[error("file type not allowed: '{0}'")]
    TypeNotAllowed(String),

    #[error("not found: '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("file too large: {size} bytes (max: {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("ingestion failed with status {status}: {body}")]
    IngestionFailed { status: u16, body: String },

    #[error("ingestion endpoint unreachable: {0}")]
    IngestionUnreachable(#[source] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Result using LocalDirError
pub type Result<T> = std::result::Result<T, LocalDirError>;

impl LocalDirError {
    /// Classify an I/O failure for `path`: a vanished file (including one
    /// lost to a check/use race) becomes `NotFound`, everything else stays
    /// an I/O fault.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            LocalDirError::NotFound(path.to_path_buf())
        } else {
            LocalDirError::Io(err)
        }
    }

    /// Whether this error represents a policy rejection (as opposed to a
    /// filesystem or network fault).
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            LocalDirError::AccessDenied(_)
                | LocalDirError::TypeNotAllowed(_)
                | LocalDirError::TooLarge { .. }
        )
    }
}
