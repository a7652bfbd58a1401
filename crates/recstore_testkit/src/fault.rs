//! Fault injection for key/value backends.
//!
//! [`FaultyBackend`] wraps a real backend and fails reads or writes on
//! demand, so tests can check that a failed write leaves no record and no
//! membership key behind.

use recstore_storage::{KvBackend, StorageError, StorageResult, WriteBatch};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// What an injected failure looks like to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The backend timed out.
    Timeout,
    /// The backend refused the call.
    Unavailable,
}

impl Fault {
    fn error(self) -> StorageError {
        match self {
            Fault::Timeout => StorageError::Timeout,
            Fault::Unavailable => StorageError::unavailable("injected fault"),
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Fault::Timeout => 0,
            Fault::Unavailable => 1,
        }
    }

    fn from_u8(raw: u8) -> Self {
        if raw == 0 {
            Fault::Timeout
        } else {
            Fault::Unavailable
        }
    }
}

/// A backend wrapper that can simulate failures.
#[derive(Debug)]
pub struct FaultyBackend<B> {
    inner: B,
    writes_before_failure: AtomicUsize,
    fail_reads: AtomicBool,
    fault: AtomicU8,
    injected: AtomicUsize,
}

impl<B: KvBackend> FaultyBackend<B> {
    /// Wraps `inner`. No faults are armed.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            writes_before_failure: AtomicUsize::new(usize::MAX),
            fail_reads: AtomicBool::new(false),
            fault: AtomicU8::new(Fault::Unavailable.to_u8()),
            injected: AtomicUsize::new(0),
        }
    }

    /// Lets `writes` more write calls through, then fails every write.
    ///
    /// A write batch counts as one write.
    pub fn fail_writes_after(&self, writes: usize) {
        self.writes_before_failure.store(writes, Ordering::SeqCst);
    }

    /// Fails every write from now on.
    pub fn fail_writes(&self) {
        self.fail_writes_after(0);
    }

    /// Sets whether point reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Chooses the error injected failures produce.
    pub fn set_fault(&self, fault: Fault) {
        self.fault.store(fault.to_u8(), Ordering::SeqCst);
    }

    /// Disarms every fault.
    pub fn reset(&self) {
        self.writes_before_failure.store(usize::MAX, Ordering::SeqCst);
        self.fail_reads.store(false, Ordering::SeqCst);
    }

    /// Returns how many calls have been failed so far.
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn fail(&self) -> StorageError {
        self.injected.fetch_add(1, Ordering::SeqCst);
        Fault::from_u8(self.fault.load(Ordering::SeqCst)).error()
    }

    fn check_write(&self) -> StorageResult<()> {
        let allowed = self
            .writes_before_failure
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(left),
                0 => None,
                n => Some(n - 1),
            });
        match allowed {
            Ok(_) => Ok(()),
            Err(_) => Err(self.fail()),
        }
    }
}

impl<B: KvBackend> KvBackend for FaultyBackend<B> {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.fail());
        }
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.check_write()?;
        self.inner.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> StorageResult<bool> {
        self.check_write()?;
        self.inner.delete(key)
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        self.check_write()?;
        self.inner.write_batch(batch)
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<Vec<u8>>> {
        self.inner.keys_with_prefix(prefix)
    }

    fn len(&self) -> StorageResult<usize> {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recstore_core::{Database, ErrorKind, Feedback, KvDatabase, User};
    use recstore_storage::InMemoryBackend;

    fn open() -> KvDatabase<FaultyBackend<InMemoryBackend>> {
        KvDatabase::open(FaultyBackend::new(InMemoryBackend::new())).unwrap()
    }

    #[test]
    fn write_budget_counts_down() {
        let backend = FaultyBackend::new(InMemoryBackend::new());
        backend.fail_writes_after(2);
        assert!(backend.put(b"a", b"1").is_ok());
        assert!(backend.put(b"b", b"2").is_ok());
        assert!(backend.put(b"c", b"3").is_err());
        assert!(backend.delete(b"a").is_err());
        assert_eq!(backend.injected(), 2);

        backend.reset();
        assert!(backend.put(b"c", b"3").is_ok());
        assert_eq!(backend.inner().len().unwrap(), 3);
    }

    #[test]
    fn unarmed_backend_never_fails() {
        let backend = FaultyBackend::new(InMemoryBackend::new());
        for i in 0..100u8 {
            backend.put(&[i], &[i]).unwrap();
        }
        assert_eq!(backend.injected(), 0);
    }

    #[test]
    fn failed_insert_is_invisible() {
        let db = open();
        db.insert_user(User::new("kept")).unwrap();
        db.backend().fail_writes();

        let err = db.insert_user(User::new("lost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(db.get_user("lost").unwrap_err().is_not_found());
        assert_eq!(db.get_users("", 10).unwrap().1.len(), 1);
        db.check_consistency().unwrap();
    }

    #[test]
    fn failed_feedback_batch_creates_no_stubs() {
        let db = open();
        db.backend().fail_writes();
        assert!(db
            .batch_insert_feedback(
                vec![Feedback::new("t", "u", "i"), Feedback::new("t", "v", "i")],
                true,
                true,
            )
            .is_err());

        db.backend().reset();
        assert!(db.get_users("", 10).unwrap().1.is_empty());
        assert!(db.get_items("", 10).unwrap().1.is_empty());
        assert!(db.get_feedback("", 10, None).unwrap().1.is_empty());
    }

    #[test]
    fn failed_cascade_keeps_everything_and_retries() {
        let db = open();
        db.insert_feedback(Feedback::new("t", "u", "i"), true, true)
            .unwrap();
        db.backend().fail_writes();

        assert!(db.delete_user("u").is_err());
        assert!(db.get_user("u").is_ok());
        assert_eq!(db.get_user_feedback("u", None).unwrap().len(), 1);
        db.check_consistency().unwrap();

        db.backend().reset();
        db.delete_user("u").unwrap();
        assert!(db.get_user("u").unwrap_err().is_not_found());
        assert!(db.get_item_feedback("i", None).unwrap().is_empty());
        db.check_consistency().unwrap();
    }

    #[test]
    fn timeouts_are_classified() {
        let db = open();
        db.backend().set_fault(Fault::Timeout);
        db.backend().fail_writes();
        let err = db.insert_user(User::new("u")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.is_timeout());
    }

    #[test]
    fn read_failures_surface_as_backend_errors() {
        let db = open();
        db.insert_user(User::new("u")).unwrap();
        db.backend().set_fail_reads(true);
        assert_eq!(db.get_user("u").unwrap_err().kind(), ErrorKind::Backend);
        assert_eq!(db.get_users("", 10).unwrap_err().kind(), ErrorKind::Backend);
    }
}
