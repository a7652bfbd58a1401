//! Reference driver over a primitive key/value backend.

use crate::config::Config;
use crate::database::{Database, Page};
use crate::driver::keys::KeyLayout;
use crate::entity::{validate_id, Feedback, FeedbackKey, Item, Record, User};
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::index::{BTreeIndex, Index, IndexKey};
use crate::page::{
    check_batch, check_limit, feedback_scope, next_token, resume, ITEMS_SCOPE, USERS_SCOPE,
};
use parking_lot::RwLock;
use recstore_codec::{from_cbor, to_cbor, Position};
use recstore_storage::{KvBackend, StorageError, WriteBatch};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tracing::{debug, trace, warn};

/// Ids a feedback batch references, split by whether they must be created.
#[derive(Debug, Default)]
struct References {
    present: BTreeSet<String>,
    stubs: BTreeSet<String>,
}

/// A [`Database`] over any [`KvBackend`].
///
/// The backend only offers point reads, point writes, atomic write batches
/// and an unordered key listing. Every piece of state lives in the backend
/// (see the key layout in `keys.rs`); the driver supplies the rest:
///
/// - ascending listings, by ordering each table's key listing in memory
/// - by-user and by-item feedback views, kept as membership keys written in
///   the same batch as the feedback record
/// - cascading deletes issued as one atomic write batch
///
/// # Consistency
///
/// Several handles may share one backend, and each sees the others' writes
/// on its next call. Every write is a single put or a single atomic batch,
/// so no reader observes half of an upsert or a cascade.
///
/// Within one handle, writers hold a write lock across their reference or
/// dependent checks and the backend write, and readers hold the read lock
/// while they resolve keys to records. Handles do not share that lock: two
/// handles racing a cascade against a feedback insert for the same user may
/// leave that feedback behind, because the backend has no conditional
/// write. A record removed between a key listing and its read is skipped.
///
/// # Example
///
/// ```rust
/// use recstore_core::{Database, KvDatabase, User};
/// use recstore_storage::InMemoryBackend;
///
/// let db = KvDatabase::open(InMemoryBackend::new()).unwrap();
/// db.insert_user(User::new("1").with_comment("hello")).unwrap();
/// assert_eq!(db.get_user("1").unwrap().comment, "hello");
/// ```
pub struct KvDatabase<B: KvBackend> {
    backend: B,
    config: Config,
    keys: KeyLayout,
    lock: RwLock<()>,
}

impl<B: KvBackend> KvDatabase<B> {
    /// Opens a database over `backend` with the default configuration.
    ///
    /// # Errors
    ///
    /// Never fails with the default configuration.
    pub fn open(backend: B) -> CoreResult<Self> {
        Self::open_with_config(backend, Config::default())
    }

    /// Opens a database over `backend`.
    ///
    /// Records already stored under the configured key prefix are served
    /// as they are; opening reads nothing from the backend.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `config` fails [`Config::validate`].
    pub fn open_with_config(backend: B, config: Config) -> CoreResult<Self> {
        config.validate()?;
        let keys = KeyLayout::new(&config.key_prefix);
        Ok(Self {
            backend,
            config,
            keys,
            lock: RwLock::new(()),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Checks that both membership tables describe exactly the stored
    /// feedback set and that no feedback references a missing user or item.
    ///
    /// # Errors
    ///
    /// Returns `Backend(Corrupted)` describing the first violation, or the
    /// backend's error if a listing or read fails.
    pub fn check_consistency(&self) -> CoreResult<()> {
        let _guard = self.lock.read();
        let feedback = self.ordered("feedback", &self.keys.feedback_prefix(None), |raw| {
            self.keys.parse_feedback(raw)
        })?;
        for kind in [EntityKind::User, EntityKind::Item] {
            let members = self.ordered("memberships", self.keys.membership_table(kind), |raw| {
                self.keys.parse_membership(kind, raw)
            })?;
            if members.len() != feedback.len() {
                return Err(corrupted(format!(
                    "{kind} memberships hold {} keys, feedback holds {}",
                    members.len(),
                    feedback.len()
                )));
            }
            if let Some(key) = members.iter_after(None).find(|k| !feedback.contains(k)) {
                return Err(corrupted(format!(
                    "{kind} membership {key} has no feedback record"
                )));
            };
        }
        for key in feedback.iter_after(None) {
            if !self.exists(EntityKind::User, &key.user_id)?
                || !self.exists(EntityKind::Item, &key.item_id)?
            {
                return Err(corrupted(format!("feedback {key} outlived its user or item")));
            }
        }
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, key: &[u8]) -> CoreResult<Option<T>> {
        match self.backend.get(key)? {
            Some(bytes) => Ok(Some(from_cbor(&bytes)?)),
            None => Ok(None),
        }
    }

    fn exists(&self, kind: EntityKind, id: &str) -> CoreResult<bool> {
        Ok(self.backend.get(&self.keys.entity(kind, id))?.is_some())
    }

    /// Lists the keys under `prefix` and orders those `parse` accepts.
    fn ordered<K, F>(&self, name: &str, prefix: &[u8], parse: F) -> CoreResult<BTreeIndex<K>>
    where
        K: IndexKey,
        F: Fn(&[u8]) -> Option<K>,
    {
        let keys = self
            .backend
            .keys_with_prefix(prefix)?
            .into_iter()
            .filter_map(|raw| {
                let key = parse(&raw);
                if key.is_none() {
                    warn!(index = name, key = %String::from_utf8_lossy(&raw), "skipping unparsable key");
                }
                key
            });
        let mut index = BTreeIndex::new(name);
        index.rebuild(keys);
        Ok(index)
    }

    /// Feedback keys of one user or item, in key order.
    fn memberships(
        &self,
        kind: EntityKind,
        id: &str,
        feedback_type: Option<&str>,
    ) -> CoreResult<BTreeIndex<FeedbackKey>> {
        self.ordered(
            "memberships",
            &self.keys.membership_prefix(kind, id, feedback_type),
            |raw| self.keys.parse_membership(kind, raw),
        )
    }

    /// Loads records for the keys after `after` until `limit` are found.
    ///
    /// Returns the resume key as well when at least one more record
    /// follows the page.
    fn collect_page<K, T, F>(
        &self,
        index: &BTreeIndex<K>,
        after: Option<&K>,
        limit: usize,
        record_key: F,
    ) -> CoreResult<(Vec<T>, Option<K>)>
    where
        K: IndexKey,
        T: DeserializeOwned,
        F: Fn(&K) -> Vec<u8>,
    {
        let mut records = Vec::new();
        let mut last = None;
        for key in index.iter_after(after) {
            let Some(record) = self.load(&record_key(key))? else {
                continue;
            };
            if records.len() == limit {
                return Ok((records, last));
            }
            records.push(record);
            last = Some(key.clone());
        }
        Ok((records, None))
    }

    fn load_feedback(&self, keys: &BTreeIndex<FeedbackKey>) -> CoreResult<Vec<Feedback>> {
        let mut records = Vec::with_capacity(keys.len());
        for key in keys.iter_after(None) {
            if let Some(record) = self.load(&self.keys.feedback(key))? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn insert_record<R: Record>(&self, record: R) -> CoreResult<()> {
        record.validate()?;
        let bytes = to_cbor(&record)?;
        let key = self.keys.entity(R::KIND, record.id());

        let _guard = self.lock.write();
        self.backend.put(&key, &bytes)?;
        debug!(kind = %R::KIND, id = record.id(), "inserted record");
        Ok(())
    }

    fn batch_insert_records<R: Record>(&self, records: Vec<R>) -> CoreResult<()> {
        check_batch(&self.config, records.len())?;
        if records.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::with_capacity(records.len());
        for record in &records {
            record.validate()?;
            batch.put(self.keys.entity(R::KIND, record.id()), to_cbor(record)?);
        }

        let _guard = self.lock.write();
        self.backend.write_batch(batch)?;
        debug!(kind = %R::KIND, count = records.len(), "inserted record batch");
        Ok(())
    }

    fn get_record<R: Record>(&self, id: &str) -> CoreResult<R> {
        validate_id("id", id)?;
        self.load(&self.keys.entity(R::KIND, id))?
            .ok_or_else(|| CoreError::not_found(R::KIND, id))
    }

    fn delete_record(&self, kind: EntityKind, id: &str) -> CoreResult<()> {
        validate_id("id", id)?;
        let _guard = self.lock.write();
        let present = self.exists(kind, id)?;
        let dependents = self.memberships(kind, id, None)?;
        if !present && dependents.is_empty() {
            trace!(%kind, id, "delete of absent record");
            return Ok(());
        }

        let mut batch = WriteBatch::with_capacity(3 * dependents.len() + 1);
        batch.delete(self.keys.entity(kind, id));
        for key in dependents.iter_after(None) {
            batch.delete(self.keys.feedback(key));
            batch.delete(self.keys.membership(EntityKind::User, key));
            batch.delete(self.keys.membership(EntityKind::Item, key));
        }
        self.backend.write_batch(batch)?;
        debug!(%kind, id, feedback = dependents.len(), "deleted record");
        Ok(())
    }

    fn list_records<R: Record>(
        &self,
        scope: &str,
        cursor: &str,
        limit: usize,
    ) -> CoreResult<Page<R>> {
        let limit = check_limit(&self.config, limit)?;
        let after = match resume(cursor, scope)? {
            None => None,
            Some(Position::After(mut parts)) if parts.len() == 1 => parts.pop(),
            Some(_) => {
                return Err(CoreError::invalid_argument(
                    "cursor position does not fit this listing",
                ))
            }
        };

        let _guard = self.lock.read();
        let ids = self.ordered(scope, self.keys.table(R::KIND), |raw| {
            self.keys.parse_entity(R::KIND, raw)
        })?;
        let (records, last) = self.collect_page(&ids, after.as_ref(), limit, |id| {
            self.keys.entity(R::KIND, id)
        })?;

        let more = last.is_some();
        trace!(scope, limit, returned = records.len(), more, "listed records");
        let next = last.map(|id| Position::After(vec![id]));
        Ok((next_token(scope, next)?, records))
    }

    /// Records `id` as present, or as a stub to create, or fails.
    fn resolve(
        &self,
        kind: EntityKind,
        id: &str,
        create: bool,
        refs: &mut References,
    ) -> CoreResult<()> {
        if refs.present.contains(id) || refs.stubs.contains(id) {
            return Ok(());
        }
        if self.exists(kind, id)? {
            refs.present.insert(id.to_string());
        } else if create {
            refs.stubs.insert(id.to_string());
        } else {
            return Err(CoreError::reference_not_found(kind, id));
        }
        Ok(())
    }

    fn write_feedback(
        &self,
        feedback: Vec<Feedback>,
        insert_user: bool,
        insert_item: bool,
    ) -> CoreResult<()> {
        check_batch(&self.config, feedback.len())?;
        if feedback.is_empty() {
            return Ok(());
        }
        let mut encoded = Vec::with_capacity(feedback.len());
        for record in &feedback {
            record.validate()?;
            encoded.push(to_cbor(record)?);
        }

        let _guard = self.lock.write();
        let mut users = References::default();
        let mut items = References::default();
        for record in &feedback {
            self.resolve(EntityKind::User, record.user_id(), insert_user, &mut users)?;
            self.resolve(EntityKind::Item, record.item_id(), insert_item, &mut items)?;
        }

        let mut batch =
            WriteBatch::with_capacity(3 * feedback.len() + users.stubs.len() + items.stubs.len());
        for id in &users.stubs {
            batch.put(self.keys.entity(EntityKind::User, id), to_cbor(&User::stub(id))?);
        }
        for id in &items.stubs {
            batch.put(self.keys.entity(EntityKind::Item, id), to_cbor(&Item::stub(id))?);
        }
        for (record, bytes) in feedback.iter().zip(encoded) {
            batch.put(self.keys.feedback(&record.key), bytes);
            batch.put(self.keys.membership(EntityKind::User, &record.key), Vec::new());
            batch.put(self.keys.membership(EntityKind::Item, &record.key), Vec::new());
        }
        self.backend.write_batch(batch)?;
        debug!(
            count = feedback.len(),
            stub_users = users.stubs.len(),
            stub_items = items.stubs.len(),
            "inserted feedback"
        );
        Ok(())
    }

    fn feedback_of(
        &self,
        kind: EntityKind,
        id: &str,
        feedback_type: Option<&str>,
    ) -> CoreResult<Vec<Feedback>> {
        let _guard = self.lock.read();
        let keys = self.memberships(kind, id, feedback_type)?;
        self.load_feedback(&keys)
    }
}

fn corrupted(message: String) -> CoreError {
    CoreError::Backend(StorageError::Corrupted(message))
}

impl<B: KvBackend> Database for KvDatabase<B> {
    fn insert_user(&self, user: User) -> CoreResult<()> {
        self.insert_record(user)
    }

    fn batch_insert_user(&self, users: Vec<User>) -> CoreResult<()> {
        self.batch_insert_records(users)
    }

    fn get_user(&self, user_id: &str) -> CoreResult<User> {
        self.get_record(user_id)
    }

    fn delete_user(&self, user_id: &str) -> CoreResult<()> {
        self.delete_record(EntityKind::User, user_id)
    }

    fn get_users(&self, cursor: &str, limit: usize) -> CoreResult<Page<User>> {
        self.list_records(USERS_SCOPE, cursor, limit)
    }

    fn insert_item(&self, item: Item) -> CoreResult<()> {
        self.insert_record(item)
    }

    fn batch_insert_item(&self, items: Vec<Item>) -> CoreResult<()> {
        self.batch_insert_records(items)
    }

    fn get_item(&self, item_id: &str) -> CoreResult<Item> {
        self.get_record(item_id)
    }

    fn delete_item(&self, item_id: &str) -> CoreResult<()> {
        self.delete_record(EntityKind::Item, item_id)
    }

    fn get_items(&self, cursor: &str, limit: usize) -> CoreResult<Page<Item>> {
        self.list_records(ITEMS_SCOPE, cursor, limit)
    }

    fn insert_feedback(
        &self,
        feedback: Feedback,
        insert_user: bool,
        insert_item: bool,
    ) -> CoreResult<()> {
        self.write_feedback(vec![feedback], insert_user, insert_item)
    }

    fn batch_insert_feedback(
        &self,
        feedback: Vec<Feedback>,
        insert_user: bool,
        insert_item: bool,
    ) -> CoreResult<()> {
        self.write_feedback(feedback, insert_user, insert_item)
    }

    fn get_feedback(
        &self,
        cursor: &str,
        limit: usize,
        feedback_type: Option<&str>,
    ) -> CoreResult<Page<Feedback>> {
        let limit = check_limit(&self.config, limit)?;
        let scope = feedback_scope(feedback_type);
        let after = match resume(cursor, &scope)? {
            None => None,
            Some(Position::After(parts)) => Some(FeedbackKey::from_parts(&parts).ok_or_else(
                || CoreError::invalid_argument("cursor position does not fit this listing"),
            )?),
            Some(Position::Offset(_)) => {
                return Err(CoreError::invalid_argument(
                    "cursor position does not fit this listing",
                ))
            }
        };

        let _guard = self.lock.read();
        let keys = self.ordered("feedback", &self.keys.feedback_prefix(feedback_type), |raw| {
            self.keys.parse_feedback(raw)
        })?;
        let (records, last) =
            self.collect_page(&keys, after.as_ref(), limit, |key| self.keys.feedback(key))?;

        let more = last.is_some();
        trace!(scope = %scope, limit, returned = records.len(), more, "listed feedback");
        let next = last.map(|key| Position::After(key.to_parts()));
        Ok((next_token(&scope, next)?, records))
    }

    fn get_user_feedback(
        &self,
        user_id: &str,
        feedback_type: Option<&str>,
    ) -> CoreResult<Vec<Feedback>> {
        validate_id("user_id", user_id)?;
        self.feedback_of(EntityKind::User, user_id, feedback_type)
    }

    fn get_item_feedback(
        &self,
        item_id: &str,
        feedback_type: Option<&str>,
    ) -> CoreResult<Vec<Feedback>> {
        validate_id("item_id", item_id)?;
        self.feedback_of(EntityKind::Item, item_id, feedback_type)
    }
}

impl<B: KvBackend> std::fmt::Debug for KvDatabase<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvDatabase")
            .field("key_prefix", &self.config.key_prefix)
            .field("max_page_size", &self.config.max_page_size)
            .field("max_batch_size", &self.config.max_batch_size)
            .finish_non_exhaustive()
    }
}
