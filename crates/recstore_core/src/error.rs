//! Error types for recstore core.

use recstore_codec::CodecError;
use recstore_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The primary entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A user.
    User,
    /// An item.
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Item => f.write_str("item"),
        }
    }
}

/// Classification every [`CoreError`] falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested user or item does not exist.
    NotFound,
    /// A feedback write references a missing user or item.
    ReferenceNotFound,
    /// Transport, driver or stored-data failure.
    Backend,
    /// Malformed cursor, bad limit or invalid entity.
    InvalidArgument,
}

/// Errors that can occur in recstore core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity not found.
    #[error("{kind} not found: {id:?}")]
    NotFound {
        /// Which entity table was searched.
        kind: EntityKind,
        /// The id that was not found.
        id: String,
    },

    /// Feedback references an entity that does not exist.
    #[error("feedback references missing {kind} {id:?}")]
    ReferenceNotFound {
        /// Which side of the feedback key is dangling.
        kind: EntityKind,
        /// The missing id.
        id: String,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Backend(#[from] StorageError),

    /// A stored record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(CodecError),

    /// Caller supplied an argument the contract rejects.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidCursor { message } => Self::InvalidArgument {
                message: format!("cursor: {message}"),
            },
            other => Self::Codec(other),
        }
    }
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a reference not found error.
    pub fn reference_not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ReferenceNotFound { .. } => ErrorKind::ReferenceNotFound,
            Self::Backend(_) | Self::Codec(_) => ErrorKind::Backend,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// Returns true if the backend timed out or the call was cancelled.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Backend(e) if e.is_timeout())
    }

    /// Returns true for [`ErrorKind::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_classified() {
        assert_eq!(
            CoreError::not_found(EntityKind::User, "1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::reference_not_found(EntityKind::Item, "2").kind(),
            ErrorKind::ReferenceNotFound
        );
        assert_eq!(
            CoreError::from(StorageError::Timeout).kind(),
            ErrorKind::Backend
        );
        assert_eq!(
            CoreError::invalid_argument("limit").kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn invalid_cursor_is_invalid_argument() {
        let err = CoreError::from(CodecError::invalid_cursor("bad"));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = CoreError::from(CodecError::decoding_failed("bad"));
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[test]
    fn timeout_is_distinguishable() {
        assert!(CoreError::from(StorageError::Timeout).is_timeout());
        assert!(!CoreError::from(StorageError::unavailable("down")).is_timeout());
    }

    #[test]
    fn display_names_entity() {
        let err = CoreError::not_found(EntityKind::Item, "42");
        assert_eq!(err.to_string(), "item not found: \"42\"");
    }
}
