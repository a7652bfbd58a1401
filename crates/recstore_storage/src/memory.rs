//! In-memory key/value backend.

use crate::backend::KvBackend;
use crate::batch::{BatchOp, WriteBatch};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory key/value backend.
///
/// Keys live in a hash map, so the backend behaves like a cache: point
/// operations are cheap and key listing comes back unordered. It is
/// suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
/// Write batches are applied under a single write lock.
///
/// # Example
///
/// ```rust
/// use recstore_storage::{InMemoryBackend, KvBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put(b"k", b"v").unwrap();
/// assert_eq!(backend.len().unwrap(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing entries.
    ///
    /// Useful for testing how drivers read records they did not write.
    #[must_use]
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        Self {
            data: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Returns a copy of all entries in the backend.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Clears all data from the backend.
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

impl KvBackend for InMemoryBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        // Single write guard for the whole batch; no step below can fail.
        let mut data = self.data.write();
        for op in batch {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<Vec<u8>>> {
        Ok(self
            .data
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.data.read().len())
    }
}
