//! Key/value backend trait definition.

use crate::batch::WriteBatch;
use crate::error::StorageResult;
use std::sync::Arc;

/// A primitive key/value backend for recstore.
///
/// Backends are **opaque byte stores** in the style of an in-memory cache.
/// They provide point reads and writes, an atomic multi-key write batch, and
/// an unordered key listing. They offer no ordered range scan; drivers built
/// on top sort the keys they list.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last written for that key
/// - `write_batch` applies every operation or none of them
/// - `keys_with_prefix` returns every live key with that prefix, in no
///   particular order
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For tests and ephemeral storage
pub trait KvBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot serve the read.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Removes `key`.
    ///
    /// Returns true if the key was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, key: &[u8]) -> StorageResult<bool>;

    /// Applies all operations of `batch` atomically.
    ///
    /// Operations apply in order, so a later put or delete of the same key
    /// wins. Readers observe either none or all of the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be applied. In that case no
    /// operation of the batch is visible.
    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Lists every key starting with `prefix`, in unspecified order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    fn keys_with_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<Vec<u8>>>;

    /// Returns the number of keys held by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn len(&self) -> StorageResult<usize>;

    /// Returns true if the backend holds no keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<B: KvBackend + ?Sized> KvBackend for Arc<B> {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> StorageResult<bool> {
        (**self).delete(key)
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        (**self).write_batch(batch)
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<Vec<u8>>> {
        (**self).keys_with_prefix(prefix)
    }

    fn len(&self) -> StorageResult<usize> {
        (**self).len()
    }
}
