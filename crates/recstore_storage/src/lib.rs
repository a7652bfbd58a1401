//! # recstore Storage
//!
//! Primitive key/value backends for recstore.
//!
//! This crate provides the lowest-level storage abstraction beneath the
//! reference `KvDatabase` driver. Backends are **opaque byte stores** - they
//! do not interpret the keys or values they hold.
//!
//! ## Design Principles
//!
//! - Backends offer point reads, point writes and atomic write batches
//! - No ordered range scan: key listing is unordered, like a cache
//! - Must be `Send + Sync` for concurrent access
//! - recstore owns all key layout and record encoding
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - Hash-map store for tests and ephemeral databases
//!
//! ## Example
//!
//! ```rust
//! use recstore_storage::{InMemoryBackend, KvBackend, WriteBatch};
//!
//! let backend = InMemoryBackend::new();
//! backend.put(b"user/1", b"alice").unwrap();
//!
//! let mut batch = WriteBatch::new();
//! batch.put(b"user/2".to_vec(), b"bob".to_vec());
//! batch.delete(b"user/1".to_vec());
//! backend.write_batch(batch).unwrap();
//!
//! assert_eq!(backend.get(b"user/1").unwrap(), None);
//! assert_eq!(backend.get(b"user/2").unwrap(), Some(b"bob".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod batch;
mod error;
mod memory;

pub use backend::KvBackend;
pub use batch::{BatchOp, WriteBatch};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;
