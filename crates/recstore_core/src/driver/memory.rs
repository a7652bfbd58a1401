//! Driver over natively ordered in-memory tables.

use crate::config::Config;
use crate::database::{Database, Page};
use crate::entity::{validate_id, Feedback, FeedbackKey, Item, Record, User};
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::index::FeedbackIndex;
use crate::page::{
    check_batch, check_limit, feedback_scope, next_token, resume, ITEMS_SCOPE, USERS_SCOPE,
};
use parking_lot::RwLock;
use recstore_codec::Position;
use recstore_storage::StorageError;
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<String, User>,
    items: BTreeMap<String, Item>,
    feedback: BTreeMap<FeedbackKey, Feedback>,
    views: FeedbackIndex,
}

impl Tables {
    fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::User => self.users.contains_key(id),
            EntityKind::Item => self.items.contains_key(id),
        }
    }

    fn feedback_of(&self, kind: EntityKind, id: &str, filter: Option<&str>) -> Vec<FeedbackKey> {
        match kind {
            EntityKind::User => self.views.for_user(id, filter),
            EntityKind::Item => self.views.for_item(id, filter),
        }
    }

    fn load_feedback(&self, keys: &[FeedbackKey]) -> Vec<Feedback> {
        keys.iter()
            .filter_map(|key| self.feedback.get(key).cloned())
            .collect()
    }
}

/// Access to one entity table, so users and items share code paths.
trait Table: Record {
    fn rows(tables: &Tables) -> &BTreeMap<String, Self>;
    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<String, Self>;
}

impl Table for User {
    fn rows(tables: &Tables) -> &BTreeMap<String, Self> {
        &tables.users
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<String, Self> {
        &mut tables.users
    }
}

impl Table for Item {
    fn rows(tables: &Tables) -> &BTreeMap<String, Self> {
        &tables.items
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<String, Self> {
        &mut tables.items
    }
}

/// A [`Database`] whose storage orders rows natively.
///
/// Rows live in ordered maps, the way a relational or document engine
/// keeps a primary-key index, so no secondary sort index is needed.
/// A [`FeedbackIndex`] plays the part of the secondary indexes on the
/// feedback table's user and item columns.
/// Cursors carry a row offset, like `LIMIT ... OFFSET ...` paging.
/// Every operation runs under one reader/writer lock, which makes upserts
/// and cascades atomic.
///
/// Nothing is persisted; dropping the database drops its data.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    config: Config,
    tables: RwLock<Tables>,
}

impl MemoryDatabase {
    /// Creates an empty database with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty database with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `config` fails [`Config::validate`].
    pub fn with_config(config: Config) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tables: RwLock::new(Tables::default()),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks that the feedback views match the feedback table and that no
    /// feedback references a missing user or item.
    ///
    /// # Errors
    ///
    /// Returns `Backend(Corrupted)` describing the first violation.
    pub fn check_consistency(&self) -> CoreResult<()> {
        let corrupted = |message: String| CoreError::Backend(StorageError::Corrupted(message));
        let tables = self.tables.read();
        tables.views.verify().map_err(corrupted)?;
        if tables.views.len() != tables.feedback.len() {
            return Err(corrupted(format!(
                "views hold {} keys, feedback table holds {}",
                tables.views.len(),
                tables.feedback.len()
            )));
        }
        for key in tables.feedback.keys() {
            if !tables.views.contains(key) {
                return Err(corrupted(format!("feedback {key} is missing from the views")));
            }
            if !tables.users.contains_key(&key.user_id) || !tables.items.contains_key(&key.item_id)
            {
                return Err(corrupted(format!("feedback {key} outlived its user or item")));
            }
        }
        Ok(())
    }

    fn insert_record<R: Table>(&self, record: R) -> CoreResult<()> {
        record.validate()?;
        let mut tables = self.tables.write();
        debug!(kind = %R::KIND, id = record.id(), "inserted record");
        R::rows_mut(&mut tables).insert(record.id().to_string(), record);
        Ok(())
    }

    fn batch_insert_records<R: Table>(&self, records: Vec<R>) -> CoreResult<()> {
        check_batch(&self.config, records.len())?;
        for record in &records {
            record.validate()?;
        }
        let count = records.len();
        let mut tables = self.tables.write();
        let rows = R::rows_mut(&mut tables);
        for record in records {
            rows.insert(record.id().to_string(), record);
        }
        debug!(kind = %R::KIND, count, "inserted record batch");
        Ok(())
    }

    fn get_record<R: Table>(&self, id: &str) -> CoreResult<R> {
        validate_id("id", id)?;
        R::rows(&self.tables.read())
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(R::KIND, id))
    }

    fn delete_record<R: Table>(&self, id: &str) -> CoreResult<()> {
        validate_id("id", id)?;
        let mut tables = self.tables.write();
        R::rows_mut(&mut tables).remove(id);
        let dependents = tables.feedback_of(R::KIND, id, None);
        for key in &dependents {
            tables.feedback.remove(key);
            tables.views.remove(key);
        }
        debug!(kind = %R::KIND, id, feedback = dependents.len(), "deleted record");
        Ok(())
    }

    fn list_records<R: Table>(&self, scope: &str, cursor: &str, limit: usize) -> CoreResult<Page<R>> {
        let limit = check_limit(&self.config, limit)?;
        let offset = offset_of(resume(cursor, scope)?)?;

        let tables = self.tables.read();
        let mut records: Vec<R> = R::rows(&tables)
            .values()
            .skip(offset)
            .take(limit.saturating_add(1))
            .cloned()
            .collect();
        drop(tables);

        let more = records.len() > limit;
        records.truncate(limit);
        let next = more.then(|| Position::Offset(offset.saturating_add(limit) as u64));
        trace!(scope, offset, limit, returned = records.len(), "listed records");
        Ok((next_token(scope, next)?, records))
    }

    fn write_feedback(
        &self,
        feedback: Vec<Feedback>,
        insert_user: bool,
        insert_item: bool,
    ) -> CoreResult<()> {
        check_batch(&self.config, feedback.len())?;
        for record in &feedback {
            record.validate()?;
        }

        let mut tables = self.tables.write();
        for record in &feedback {
            if !insert_user && !tables.contains(EntityKind::User, record.user_id()) {
                return Err(CoreError::reference_not_found(
                    EntityKind::User,
                    record.user_id(),
                ));
            }
            if !insert_item && !tables.contains(EntityKind::Item, record.item_id()) {
                return Err(CoreError::reference_not_found(
                    EntityKind::Item,
                    record.item_id(),
                ));
            }
        }

        let count = feedback.len();
        for record in feedback {
            tables
                .users
                .entry(record.key.user_id.clone())
                .or_insert_with(|| User::stub(&record.key.user_id));
            tables
                .items
                .entry(record.key.item_id.clone())
                .or_insert_with(|| Item::stub(&record.key.item_id));
            tables.views.insert(record.key.clone());
            tables.feedback.insert(record.key.clone(), record);
        }
        debug!(count, "inserted feedback");
        Ok(())
    }
}

/// Reads an offset cursor. Positions of any other shape are rejected.
fn offset_of(position: Option<Position>) -> CoreResult<usize> {
    match position {
        None => Ok(0),
        Some(Position::Offset(n)) => usize::try_from(n)
            .map_err(|_| CoreError::invalid_argument("cursor offset out of range")),
        Some(Position::After(_)) => Err(CoreError::invalid_argument(
            "cursor position does not fit this listing",
        )),
    }
}

impl Database for MemoryDatabase {
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
        self.delete_record::<User>(user_id)
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
        self.delete_record::<Item>(item_id)
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
        let offset = offset_of(resume(cursor, &scope)?)?;

        let tables = self.tables.read();
        let mut records: Vec<Feedback> = tables
            .feedback
            .iter()
            .filter(|(key, _)| key.matches_type(feedback_type))
            .skip(offset)
            .take(limit.saturating_add(1))
            .map(|(_, record)| record.clone())
            .collect();
        drop(tables);

        let more = records.len() > limit;
        records.truncate(limit);
        let next = more.then(|| Position::Offset(offset.saturating_add(limit) as u64));
        trace!(scope = %scope, offset, limit, returned = records.len(), "listed feedback");
        Ok((next_token(&scope, next)?, records))
    }

    fn get_user_feedback(
        &self,
        user_id: &str,
        feedback_type: Option<&str>,
    ) -> CoreResult<Vec<Feedback>> {
        validate_id("user_id", user_id)?;
        let tables = self.tables.read();
        let keys = tables.feedback_of(EntityKind::User, user_id, feedback_type);
        Ok(tables.load_feedback(&keys))
    }

    fn get_item_feedback(
        &self,
        item_id: &str,
        feedback_type: Option<&str>,
    ) -> CoreResult<Vec<Feedback>> {
        validate_id("item_id", item_id)?;
        let tables = self.tables.read();
        let keys = tables.feedback_of(EntityKind::Item, item_id, feedback_type);
        Ok(tables.load_feedback(&keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use recstore_codec::Cursor;

    #[test]
    fn offset_cursor_resumes() {
        let db = MemoryDatabase::new();
        db.batch_insert_user((0..5).map(|i| User::new(i.to_string())).collect())
            .unwrap();

        let (cursor, first) = db.get_users("", 2).unwrap();
        assert_eq!(
            Cursor::decode(&cursor).unwrap().unwrap().position(),
            &Position::Offset(2)
        );
        let (_, second) = db.get_users(&cursor, 2).unwrap();
        assert_eq!(first[1].user_id, "1");
        assert_eq!(second[0].user_id, "2");
    }

    #[test]
    fn key_cursor_is_rejected() {
        let db = MemoryDatabase::new();
        let token = Cursor::new("users", Position::After(vec!["1".into()]))
            .encode()
            .unwrap();
        assert_eq!(
            db.get_users(&token, 2).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn missing_item_reference_fails_before_writing() {
        let db = MemoryDatabase::new();
        let err = db
            .batch_insert_feedback(
                vec![Feedback::new("t", "u", "i"), Feedback::new("t", "u", "j")],
                true,
                false,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ReferenceNotFound {
                kind: EntityKind::Item,
                ..
            }
        ));
        assert!(db.get_user("u").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_cascades_only_matching_side() {
        let db = MemoryDatabase::new();
        db.batch_insert_feedback(
            vec![Feedback::new("t", "a", "a"), Feedback::new("t", "b", "a")],
            true,
            true,
        )
        .unwrap();

        // Deleting user "a" leaves item "a" and user "b"'s feedback alone.
        db.delete_user("a").unwrap();
        assert!(db.get_item("a").is_ok());
        assert_eq!(db.get_item_feedback("a", None).unwrap().len(), 1);
        db.check_consistency().unwrap();
    }

    #[test]
    fn views_follow_overrides_and_cascades() {
        let db = MemoryDatabase::new();
        db.batch_insert_feedback(
            vec![
                Feedback::new("like", "u", "i"),
                Feedback::new("read", "u", "i"),
                Feedback::new("like", "v", "i"),
            ],
            true,
            true,
        )
        .unwrap();
        db.insert_feedback(Feedback::new("like", "u", "i").with_comment("again"), false, false)
            .unwrap();
        db.check_consistency().unwrap();

        let liked = db.get_item_feedback("i", Some("like")).unwrap();
        assert_eq!(
            liked.iter().map(Feedback::user_id).collect::<Vec<_>>(),
            ["u", "v"]
        );
        assert_eq!(liked[0].comment, "again");

        db.delete_item("i").unwrap();
        assert!(db.get_user_feedback("u", None).unwrap().is_empty());
        db.check_consistency().unwrap();
    }

    #[test]
    fn uncapped_page_size_returns_everything() {
        let db = MemoryDatabase::with_config(Config::new().max_page_size(usize::MAX)).unwrap();
        db.batch_insert_feedback(
            vec![Feedback::new("t", "u1", "i"), Feedback::new("t", "u2", "i")],
            true,
            true,
        )
        .unwrap();

        let (cursor, users) = db.get_users("", usize::MAX).unwrap();
        assert_eq!((cursor.as_str(), users.len()), ("", 2));
        let (cursor, feedback) = db.get_feedback("", usize::MAX, None).unwrap();
        assert_eq!((cursor.as_str(), feedback.len()), ("", 2));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        for config in [Config::new().max_page_size(0), Config::new().max_batch_size(0)] {
            let err = MemoryDatabase::with_config(config).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }
}
