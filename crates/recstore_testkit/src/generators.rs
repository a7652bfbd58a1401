//! Property-based test generators using proptest.
//!
//! Identifiers are drawn from small alphabets so that generated
//! operations collide often: overrides, stubs and cascades are the
//! interesting cases.

use proptest::prelude::*;
use recstore_core::{Database, Feedback, Item, Timestamp, User};

/// Strategy for identifiers from a small, collision-prone pool.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-d][0-3]?").expect("Invalid regex")
}

/// Strategy for feedback type names.
pub fn feedback_type_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["click", "like", "read"]).prop_map(String::from)
}

/// Strategy for short label lists.
pub fn labels_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,6}", 0..4)
}

/// Strategy for timestamps within a few decades of the epoch.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    (0i64..2_000_000_000_000).prop_map(Timestamp::from_millis)
}

/// Strategy for valid users.
pub fn user_strategy() -> impl Strategy<Value = User> {
    (id_strategy(), labels_strategy(), labels_strategy(), ".{0,16}").prop_map(
        |(id, labels, subscribe, comment)| {
            User::new(id)
                .with_labels(labels)
                .with_subscribe(subscribe)
                .with_comment(comment)
        },
    )
}

/// Strategy for valid items.
pub fn item_strategy() -> impl Strategy<Value = Item> {
    (id_strategy(), timestamp_strategy(), labels_strategy(), ".{0,16}").prop_map(
        |(id, timestamp, labels, comment)| {
            Item::new(id)
                .with_timestamp(timestamp)
                .with_labels(labels)
                .with_comment(comment)
        },
    )
}

/// Strategy for valid feedback.
pub fn feedback_strategy() -> impl Strategy<Value = Feedback> {
    (
        feedback_type_strategy(),
        id_strategy(),
        id_strategy(),
        timestamp_strategy(),
        ".{0,16}",
    )
        .prop_map(|(feedback_type, user, item, timestamp, comment)| {
            Feedback::new(feedback_type, user, item)
                .with_timestamp(timestamp)
                .with_comment(comment)
        })
}

/// One mutating call against a [`Database`].
#[derive(Debug, Clone)]
pub enum DbOperation {
    /// Insert or replace a user.
    InsertUser(User),
    /// Insert or replace an item.
    InsertItem(Item),
    /// Insert feedback.
    InsertFeedback {
        /// The records to insert.
        feedback: Vec<Feedback>,
        /// Create missing users.
        insert_user: bool,
        /// Create missing items.
        insert_item: bool,
    },
    /// Delete a user and its feedback.
    DeleteUser(String),
    /// Delete an item and its feedback.
    DeleteItem(String),
}

impl DbOperation {
    /// Applies the operation. Reference errors are expected and returned.
    pub fn apply(&self, db: &dyn Database) -> recstore_core::CoreResult<()> {
        match self {
            DbOperation::InsertUser(user) => db.insert_user(user.clone()),
            DbOperation::InsertItem(item) => db.insert_item(item.clone()),
            DbOperation::InsertFeedback {
                feedback,
                insert_user,
                insert_item,
            } => db.batch_insert_feedback(feedback.clone(), *insert_user, *insert_item),
            DbOperation::DeleteUser(id) => db.delete_user(id),
            DbOperation::DeleteItem(id) => db.delete_item(id),
        }
    }
}

/// Strategy for generating database operations.
pub fn db_operation_strategy() -> impl Strategy<Value = DbOperation> {
    prop_oneof![
        2 => user_strategy().prop_map(DbOperation::InsertUser),
        2 => item_strategy().prop_map(DbOperation::InsertItem),
        4 => (
            prop::collection::vec(feedback_strategy(), 1..4),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(feedback, insert_user, insert_item)| DbOperation::InsertFeedback {
                feedback,
                insert_user,
                insert_item,
            }),
        1 => id_strategy().prop_map(DbOperation::DeleteUser),
        1 => id_strategy().prop_map(DbOperation::DeleteItem),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<DbOperation>> {
    prop::collection::vec(db_operation_strategy(), min_ops..max_ops)
}
