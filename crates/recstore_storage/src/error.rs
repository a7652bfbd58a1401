//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backend cannot be reached or refused the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer in time.
    #[error("backend operation timed out")]
    Timeout,

    /// The backend returned data that cannot be trusted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Returns true if this error is a timeout or cancellation.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_classification() {
        assert!(StorageError::Timeout.is_timeout());
        assert!(StorageError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).is_timeout());
        assert!(!StorageError::unavailable("down").is_timeout());
        assert!(!StorageError::Corrupted("bad".into()).is_timeout());
    }
}
