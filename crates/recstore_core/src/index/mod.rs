//! In-process index structures.
//!
//! The key/value driver keeps no index state between calls: it orders the
//! keys a backend listing returns with a [`BTreeIndex`] and then walks it.
//! The memory driver keeps a [`FeedbackIndex`] beside its tables and
//! updates it with every write.
//!
//! # Index Types
//!
//! - [`BTreeIndex`]: ordered key set for ascending, resumable listing
//! - [`HashIndex`]: key to ordered member set, for foreign-key lookups
//! - [`FeedbackIndex`]: the total-order, by-user and by-item views of the
//!   feedback key set, mutated together

mod btree;
mod feedback;
mod hash;
mod traits;

pub use btree::BTreeIndex;
pub use feedback::FeedbackIndex;
pub use hash::HashIndex;
pub use traits::{Index, IndexKey};
