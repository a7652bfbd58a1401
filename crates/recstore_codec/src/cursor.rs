//! Opaque pagination tokens.
//!
//! A token is the URL-safe, unpadded base64 form of a CBOR-encoded
//! [`Cursor`]. The cursor carries the listing it was produced for (its
//! scope) so a token submitted to a different listing is rejected instead
//! of silently resuming at a meaningless position.
//!
//! The empty string is reserved: it means "start" when passed in and "no
//! more pages" when handed back.

use crate::error::{CodecError, CodecResult};
use crate::record::{from_cbor, to_cbor};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Token format version. Tokens carrying another version are rejected.
pub const CURSOR_VERSION: u8 = 1;

/// The sentinel token for the first request and the last response.
pub const START: &str = "";

/// Where a listing resumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    /// Resume strictly after this key. Multi-part keys keep one element per
    /// component.
    After(Vec<String>),
    /// Skip this many records from the start of the listing.
    Offset(u64),
}

/// A decoded pagination token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "v")]
    version: u8,
    #[serde(rename = "s")]
    scope: String,
    #[serde(rename = "p")]
    position: Position,
}

impl Cursor {
    /// Creates a cursor for the listing named `scope`.
    pub fn new(scope: impl Into<String>, position: Position) -> Self {
        Self {
            version: CURSOR_VERSION,
            scope: scope.into(),
            position,
        }
    }

    /// Returns the listing this cursor belongs to.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the resume position.
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Encodes this cursor into an opaque, non-empty token.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be serialized.
    pub fn encode(&self) -> CodecResult<String> {
        let bytes = to_cbor(self)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Decodes a token. Returns `None` for the start sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidCursor`] if the token is not one this
    /// codec produced.
    pub fn decode(token: &str) -> CodecResult<Option<Self>> {
        if token == START {
            return Ok(None);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| CodecError::invalid_cursor(format!("not base64: {e}")))?;
        let cursor: Self = from_cbor(&bytes)
            .map_err(|e| CodecError::invalid_cursor(format!("unreadable payload: {e}")))?;
        if cursor.version != CURSOR_VERSION {
            return Err(CodecError::invalid_cursor(format!(
                "unsupported version {}",
                cursor.version
            )));
        }
        Ok(Some(cursor))
    }

    /// Decodes a token submitted to the listing named `scope`.
    ///
    /// Returns `None` for the start sentinel, otherwise the resume position.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidCursor`] if the token is malformed or
    /// was produced by a different listing.
    pub fn decode_for(token: &str, scope: &str) -> CodecResult<Option<Position>> {
        match Self::decode(token)? {
            None => Ok(None),
            Some(cursor) if cursor.scope == scope => Ok(Some(cursor.position)),
            Some(cursor) => Err(CodecError::invalid_cursor(format!(
                "token belongs to '{}', not '{}'",
                cursor.scope, scope
            ))),
        }
    }
}
