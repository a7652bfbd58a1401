//! # recstore Codec
//!
//! Record and cursor encoding for recstore.
//!
//! This crate provides:
//! - CBOR encoding of stored records via serde ([`to_cbor`], [`from_cbor`])
//! - Opaque pagination tokens ([`Cursor`])
//!
//! ## Cursor Rules
//!
//! - The empty string means "start from the beginning"
//! - A returned token resumes the listing that produced it and no other
//! - Callers never build or inspect tokens; they pass them back verbatim
//!
//! ## Usage
//!
//! ```
//! use recstore_codec::{Cursor, Position};
//!
//! let token = Cursor::new("users", Position::After(vec!["7".into()]))
//!     .encode()
//!     .unwrap();
//!
//! let position = Cursor::decode_for(&token, "users").unwrap();
//! assert_eq!(position, Some(Position::After(vec!["7".into()])));
//! assert!(Cursor::decode_for(&token, "items").is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cursor;
mod error;
mod record;

pub use cursor::{Cursor, Position, CURSOR_VERSION, START};
pub use error::{CodecError, CodecResult};
pub use record::{from_cbor, to_cbor};
