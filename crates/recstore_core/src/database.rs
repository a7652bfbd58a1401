//! The storage contract every driver implements.

use crate::entity::{Feedback, Item, User};
use crate::error::CoreResult;

/// One page of a listing: the continuation token and the records.
///
/// An empty token means this was the last page.
pub type Page<T> = (String, Vec<T>);

/// Uniform data access for users, items and feedback.
///
/// Application code depends on this trait only, never on a concrete
/// driver, so identical logic runs over any backing store.
///
/// # Guarantees
///
/// - Inserts are upserts with full replacement: a re-inserted record keeps
///   none of the previous field values.
/// - Deleting a user or item removes every feedback record referencing it
///   before the call returns; no reader observes a dangling reference.
/// - Deleting an absent user or item succeeds and changes nothing.
/// - `get_user_feedback(u, None)` and a full `get_feedback` scan filtered
///   to user `u` always return the same set; likewise for items.
/// - Batches are all-or-nothing: on error nothing of the batch is visible.
///
/// # Pagination
///
/// Listing calls take a cursor and a limit and return a [`Page`]. Pass
/// `""` to start. Pass a returned token back verbatim, to the same
/// operation with the same filter, to continue. A page holds at most
/// `limit` records and is shorter only when it is the last one.
/// Concurrent writes may cause records to be missed or repeated across
/// pages; they never corrupt a record.
///
/// # Errors
///
/// Every operation returns a [`crate::CoreError`] classified by
/// [`crate::CoreError::kind`].
pub trait Database: Send + Sync {
    /// Inserts or fully replaces a user.
    fn insert_user(&self, user: User) -> CoreResult<()>;

    /// Inserts or replaces every user of the batch, all-or-nothing.
    fn batch_insert_user(&self, users: Vec<User>) -> CoreResult<()>;

    /// Returns the user with this id, or `NotFound`.
    fn get_user(&self, user_id: &str) -> CoreResult<User>;

    /// Deletes a user and every feedback record it gave.
    fn delete_user(&self, user_id: &str) -> CoreResult<()>;

    /// Lists users in ascending `user_id` order.
    fn get_users(&self, cursor: &str, limit: usize) -> CoreResult<Page<User>>;

    /// Inserts or fully replaces an item.
    fn insert_item(&self, item: Item) -> CoreResult<()>;

    /// Inserts or replaces every item of the batch, all-or-nothing.
    fn batch_insert_item(&self, items: Vec<Item>) -> CoreResult<()>;

    /// Returns the item with this id, or `NotFound`.
    fn get_item(&self, item_id: &str) -> CoreResult<Item>;

    /// Deletes an item and every feedback record about it.
    fn delete_item(&self, item_id: &str) -> CoreResult<()>;

    /// Lists items in ascending `item_id` order.
    fn get_items(&self, cursor: &str, limit: usize) -> CoreResult<Page<Item>>;

    /// Inserts or fully replaces a feedback record.
    ///
    /// A missing user (item) is created as a stub when `insert_user`
    /// (`insert_item`) is true; otherwise the call fails with
    /// `ReferenceNotFound`. Existing users and items are left untouched.
    fn insert_feedback(
        &self,
        feedback: Feedback,
        insert_user: bool,
        insert_item: bool,
    ) -> CoreResult<()>;

    /// Applies [`Database::insert_feedback`] to every record, all-or-nothing.
    fn batch_insert_feedback(
        &self,
        feedback: Vec<Feedback>,
        insert_user: bool,
        insert_item: bool,
    ) -> CoreResult<()>;

    /// Lists feedback ordered by `(feedback_type, user_id, item_id)`,
    /// optionally restricted to one type.
    fn get_feedback(
        &self,
        cursor: &str,
        limit: usize,
        feedback_type: Option<&str>,
    ) -> CoreResult<Page<Feedback>>;

    /// Returns all feedback given by a user, optionally of one type,
    /// ordered by `(feedback_type, item_id)`.
    fn get_user_feedback(
        &self,
        user_id: &str,
        feedback_type: Option<&str>,
    ) -> CoreResult<Vec<Feedback>>;

    /// Returns all feedback about an item, optionally of one type,
    /// ordered by `(feedback_type, user_id)`.
    fn get_item_feedback(
        &self,
        item_id: &str,
        feedback_type: Option<&str>,
    ) -> CoreResult<Vec<Feedback>>;
}
