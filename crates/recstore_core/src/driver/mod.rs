//! Database drivers.
//!
//! - [`KvDatabase`]: any [`KvBackend`](recstore_storage::KvBackend), with
//!   with membership keys in the backend for foreign-key lookups
//! - [`MemoryDatabase`]: natively ordered tables with offset cursors

mod keys;
mod kv;
mod memory;

pub use kv::KvDatabase;
pub use memory::MemoryDatabase;
