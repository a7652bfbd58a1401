//! Index traits and key types.

use std::hash::Hash;

/// A key that can be indexed.
///
/// Index keys must be:
/// - Hashable (for HashIndex)
/// - Orderable (for BTreeIndex)
/// - Cheap enough to clone into results
pub trait IndexKey: Clone + Eq + Hash + Ord + Send + Sync + 'static {}

impl<T> IndexKey for T where T: Clone + Eq + Hash + Ord + Send + Sync + 'static {}

/// Core index trait.
///
/// All index implementations must provide these operations.
pub trait Index<K: IndexKey>: Send + Sync {
    /// Returns the index name, used in log output.
    fn name(&self) -> &str;

    /// Checks if the index contains a key.
    fn contains(&self, key: &K) -> bool;

    /// Returns the number of entries in the index.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
