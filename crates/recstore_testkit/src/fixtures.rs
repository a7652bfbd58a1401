//! Test fixtures and database helpers.
//!
//! Provides convenience functions for opening every driver the same way
//! and for setting up common test scenarios.

use recstore_core::{Config, Database, Item, KvDatabase, MemoryDatabase, User};
use recstore_storage::InMemoryBackend;
use std::fmt;
use std::sync::Arc;

/// The drivers shipped with recstore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// [`KvDatabase`] over an [`InMemoryBackend`].
    Kv,
    /// [`MemoryDatabase`].
    Memory,
}

impl Driver {
    /// Every driver, in a stable order.
    pub const ALL: [Driver; 2] = [Driver::Kv, Driver::Memory];

    /// Returns a short name for test output.
    pub fn name(self) -> &'static str {
        match self {
            Driver::Kv => "kv",
            Driver::Memory => "memory",
        }
    }

    /// Opens a fresh, empty database.
    pub fn open(self) -> Box<dyn Database> {
        self.open_with_config(Config::default())
    }

    /// Opens a fresh, empty database with the given configuration.
    pub fn open_with_config(self, config: Config) -> Box<dyn Database> {
        match self {
            Driver::Kv => Box::new(
                KvDatabase::open_with_config(InMemoryBackend::new(), config)
                    .expect("Failed to open key/value database"),
            ),
            Driver::Memory => Box::new(
                MemoryDatabase::with_config(config).expect("Failed to open memory database"),
            ),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A test database that remembers which driver backs it.
pub struct TestDatabase {
    /// The driver that opened the database.
    pub driver: Driver,
    /// The database instance.
    pub db: Box<dyn Database>,
}

impl TestDatabase {
    /// Opens a fresh database on `driver`.
    pub fn new(driver: Driver) -> Self {
        Self {
            driver,
            db: driver.open(),
        }
    }

    /// Opens a fresh key/value database.
    pub fn kv() -> Self {
        Self::new(Driver::Kv)
    }

    /// Opens a fresh natively ordered database.
    pub fn memory() -> Self {
        Self::new(Driver::Memory)
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = dyn Database;

    fn deref(&self) -> &Self::Target {
        self.db.as_ref()
    }
}

impl fmt::Debug for TestDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDatabase")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

/// Opens a key/value database whose backend stays reachable, so tests
/// can open more handles over it or inspect raw keys.
pub fn shared_kv_database() -> (KvDatabase<Arc<InMemoryBackend>>, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    let db = KvDatabase::open(Arc::clone(&backend)).expect("Failed to open key/value database");
    (db, backend)
}

/// Runs `f` once per driver, each time on a fresh database.
///
/// # Example
///
/// ```rust
/// use recstore_core::User;
/// use recstore_testkit::with_each_driver;
///
/// with_each_driver(|driver, db| {
///     db.insert_user(User::new("1")).unwrap();
///     assert_eq!(db.get_user("1").unwrap().user_id, "1", "{driver}");
/// });
/// ```
pub fn with_each_driver<F>(mut f: F)
where
    F: FnMut(Driver, &dyn Database),
{
    for driver in Driver::ALL {
        let db = driver.open();
        f(driver, db.as_ref());
    }
}

/// Installs a test-friendly `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Calling this
/// more than once is harmless.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use recstore_core::Feedback;

    /// Inserts users `0..users` and items `0..items`.
    pub fn populate(db: &dyn Database, users: usize, items: usize) {
        db.batch_insert_user((0..users).map(|i| User::new(i.to_string())).collect())
            .expect("Failed to insert users");
        db.batch_insert_item((0..items).map(|i| Item::new(i.to_string())).collect())
            .expect("Failed to insert items");
    }

    /// Inserts one `feedback_type` record for every user and item pair.
    ///
    /// Missing users and items are created as stubs.
    pub fn dense_feedback(db: &dyn Database, feedback_type: &str, users: usize, items: usize) {
        let feedback = (0..users)
            .flat_map(|u| {
                (0..items).map(move |i| Feedback::new(feedback_type, u.to_string(), i.to_string()))
            })
            .collect();
        db.batch_insert_feedback(feedback, true, true)
            .expect("Failed to insert feedback");
    }
}
