//! Secondary indexes over feedback keys.

use crate::entity::FeedbackKey;
use crate::index::btree::BTreeIndex;
use crate::index::hash::HashIndex;
use crate::index::traits::Index;

/// The three views of the feedback key set, maintained together.
///
/// - `by_key`: every key in total order
/// - `by_user`: user id to that user's keys
/// - `by_item`: item id to that item's keys
///
/// Every mutation goes through this type, so the by-user and by-item
/// projections always describe the same set as `by_key`.
#[derive(Debug, Clone)]
pub struct FeedbackIndex {
    by_key: BTreeIndex<FeedbackKey>,
    by_user: HashIndex<String, FeedbackKey>,
    by_item: HashIndex<String, FeedbackKey>,
}

impl Default for FeedbackIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackIndex {
    /// Creates empty indexes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_key: BTreeIndex::new("feedback"),
            by_user: HashIndex::new("feedback_by_user"),
            by_item: HashIndex::new("feedback_by_item"),
        }
    }

    /// Adds a key to every view. Returns true if it was new.
    pub fn insert(&mut self, key: FeedbackKey) -> bool {
        if !self.by_key.insert(key.clone()) {
            return false;
        }
        self.by_user.insert(key.user_id.clone(), key.clone());
        self.by_item.insert(key.item_id.clone(), key);
        true
    }

    /// Removes a key from every view. Returns true if it was present.
    pub fn remove(&mut self, key: &FeedbackKey) -> bool {
        if !self.by_key.remove(key) {
            return false;
        }
        self.by_user.remove(&key.user_id, key);
        self.by_item.remove(&key.item_id, key);
        true
    }

    /// Checks membership.
    #[must_use]
    pub fn contains(&self, key: &FeedbackKey) -> bool {
        self.by_key.contains(key)
    }

    /// Keys given by `user_id`, optionally of one type, ordered by
    /// `(feedback_type, item_id)`.
    #[must_use]
    pub fn for_user(&self, user_id: &str, filter: Option<&str>) -> Vec<FeedbackKey> {
        self.by_user
            .lookup_where(&user_id.to_string(), |k| k.matches_type(filter))
    }

    /// Keys about `item_id`, optionally of one type, ordered by
    /// `(feedback_type, user_id)`.
    #[must_use]
    pub fn for_item(&self, item_id: &str, filter: Option<&str>) -> Vec<FeedbackKey> {
        self.by_item
            .lookup_where(&item_id.to_string(), |k| k.matches_type(filter))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Returns true if no key is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Checks that the three views describe the same key set.
    ///
    /// # Errors
    ///
    /// Returns a description of the first disagreement found.
    pub fn verify(&self) -> Result<(), String> {
        for (view, len) in [
            (self.by_user.name(), self.by_user.len()),
            (self.by_item.name(), self.by_item.len()),
        ] {
            if len != self.by_key.len() {
                return Err(format!(
                    "{view} holds {len} keys, {} holds {}",
                    self.by_key.name(),
                    self.by_key.len()
                ));
            }
        }
        for (user_id, key) in self.by_user.iter() {
            if &key.user_id != user_id || !self.by_key.contains(key) {
                return Err(format!("by_user entry {user_id} -> {key} is stale"));
            }
        }
        for (item_id, key) in self.by_item.iter() {
            if &key.item_id != item_id || !self.by_key.contains(key) {
                return Err(format!("by_item entry {item_id} -> {key} is stale"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeedbackIndex {
        let mut index = FeedbackIndex::new();
        for (t, u, i) in [
            ("pos", "0", "0"),
            ("pos", "1", "2"),
            ("pos", "2", "4"),
            ("neg", "0", "2"),
            ("neg", "2", "4"),
        ] {
            index.insert(FeedbackKey::new(t, u, i));
        }
        index
    }

    #[test]
    fn views_stay_in_sync() {
        let mut index = sample();
        assert_eq!(index.len(), 5);
        index.verify().unwrap();

        assert!(index.remove(&FeedbackKey::new("pos", "2", "4")));
        assert!(!index.remove(&FeedbackKey::new("pos", "2", "4")));
        index.verify().unwrap();
        assert_eq!(index.for_user("2", None), vec![FeedbackKey::new("neg", "2", "4")]);
        assert_eq!(index.for_item("4", None), vec![FeedbackKey::new("neg", "2", "4")]);
    }

    #[test]
    fn verify_reports_stale_views() {
        let mut index = sample();
        let key = FeedbackKey::new("pos", "1", "2");
        index.by_user.remove(&key.user_id, &key);
        assert!(index.verify().is_err());

        index.by_user.insert(key.user_id.clone(), key.clone());
        index.verify().unwrap();
        assert!(index.contains(&key));
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut index = sample();
        assert!(!index.insert(FeedbackKey::new("pos", "0", "0")));
        assert_eq!(index.len(), 5);
        index.verify().unwrap();
    }

    #[test]
    fn lookups_by_user_and_item() {
        let index = sample();
        assert_eq!(index.for_user("2", None).len(), 2);
        assert_eq!(
            index.for_user("2", Some("pos")),
            vec![FeedbackKey::new("pos", "2", "4")]
        );
        assert_eq!(index.for_item("2", None).len(), 2);
        assert_eq!(index.for_item("2", Some("neg")).len(), 1);
        assert!(index.for_user("nobody", None).is_empty());
    }
}
