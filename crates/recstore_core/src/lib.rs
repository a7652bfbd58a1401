//! # recstore Core
//!
//! Storage layer of a recommender system: users, items and the feedback
//! linking them, behind one driver-independent [`Database`] contract.
//!
//! This crate provides:
//! - The entity model ([`User`], [`Item`], [`Feedback`])
//! - The [`Database`] trait every driver implements
//! - A driver over any key/value backend ([`KvDatabase`])
//! - A driver over natively ordered tables ([`MemoryDatabase`])
//! - The in-process index structures both drivers build on ([`index`])
//!
//! ## Guarantees
//!
//! - Inserting an existing id replaces the entity
//! - Deleting a user or item deletes every feedback referencing it
//! - Listings are ascending by key and resume from opaque cursors
//! - A failed batch leaves nothing written
//!
//! ## Usage
//!
//! ```
//! use recstore_core::{Database, Feedback, KvDatabase, User};
//! use recstore_storage::InMemoryBackend;
//!
//! let db = KvDatabase::open(InMemoryBackend::new()).unwrap();
//! db.insert_user(User::new("alice")).unwrap();
//! db.insert_feedback(Feedback::new("click", "alice", "book"), false, true)
//!     .unwrap();
//!
//! let (cursor, items) = db.get_items("", 10).unwrap();
//! assert!(cursor.is_empty());
//! assert_eq!(items[0].item_id, "book");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod driver;
mod entity;
mod error;
pub mod index;
mod page;
mod types;

pub use config::{Config, DEFAULT_KEY_PREFIX};
pub use database::{Database, Page};
pub use driver::{KvDatabase, MemoryDatabase};
pub use entity::{Feedback, FeedbackKey, Item, User};
pub use error::{CoreError, CoreResult, EntityKind, ErrorKind};
pub use types::Timestamp;
