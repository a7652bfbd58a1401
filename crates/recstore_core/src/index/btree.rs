//! BTree index implementation.

use crate::index::traits::{Index, IndexKey};
use std::collections::BTreeSet;
use std::ops::Bound;

/// Ordered set of keys supporting resumable scans.
///
/// `BTreeIndex` gives key/value drivers the ascending order their
/// backends lack: a driver lists a table's keys, loads them into an index,
/// and walks it from just after the last key a cursor delivered.
///
/// # Example
///
/// ```rust
/// use recstore_core::index::BTreeIndex;
///
/// let mut index = BTreeIndex::new("users");
/// index.rebuild(["3", "1", "2"].map(String::from));
///
/// let first: Vec<_> = index.iter_after(None).take(2).collect();
/// assert_eq!(first, ["1", "2"]);
/// let rest: Vec<_> = index.iter_after(Some(&"2".to_string())).collect();
/// assert_eq!(rest, ["3"]);
/// ```
#[derive(Debug, Clone)]
pub struct BTreeIndex<K: IndexKey> {
    /// Index name.
    name: String,
    /// Ordered keys.
    entries: BTreeSet<K>,
}

impl<K: IndexKey> BTreeIndex<K> {
    /// Creates a new BTree index.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeSet::new(),
        }
    }

    /// Adds a key. Returns true if it was not present.
    pub fn insert(&mut self, key: K) -> bool {
        self.entries.insert(key)
    }

    /// Removes a key. Returns true if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key)
    }

    /// Iterates in ascending order over the keys strictly greater than
    /// `after`, or over every key when `after` is `None`.
    ///
    /// `after` need not be present in the index.
    pub fn iter_after<'a>(&'a self, after: Option<&K>) -> impl Iterator<Item = &'a K> + 'a {
        let lower = match after {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };
        self.entries.range((lower, Bound::Unbounded))
    }

    /// Replaces the contents with `keys`.
    pub fn rebuild<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        self.entries = keys.into_iter().collect();
    }
}

impl<K: IndexKey> Index<K> for BTreeIndex<K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> BTreeIndex<String> {
        let mut index = BTreeIndex::new("ids");
        index.rebuild(values.iter().map(|v| (*v).to_string()));
        index
    }

    fn page(index: &BTreeIndex<String>, after: Option<&str>, limit: usize) -> Vec<String> {
        index
            .iter_after(after.map(str::to_string).as_ref())
            .take(limit)
            .cloned()
            .collect()
    }

    #[test]
    fn insert_and_contains() {
        let mut index = BTreeIndex::new("ids");
        assert!(index.insert("a".to_string()));
        assert!(!index.insert("a".to_string()));
        assert!(index.contains(&"a".to_string()));
        assert_eq!(index.len(), 1);
        assert_eq!(index.name(), "ids");
    }

    #[test]
    fn pages_cover_every_key_once() {
        let index = ids(&["5", "3", "9", "1", "7"]);

        let mut seen: Vec<String> = Vec::new();
        loop {
            let next = page(&index, seen.last().map(String::as_str), 2);
            if next.is_empty() {
                break;
            }
            seen.extend(next);
        }
        assert_eq!(seen, vec!["1", "3", "5", "7", "9"]);
    }

    #[test]
    fn resuming_after_missing_key_starts_at_successor() {
        let index = ids(&["1", "3", "5"]);
        assert_eq!(page(&index, Some("2"), 10), vec!["3", "5"]);
        assert!(page(&index, Some("5"), 10).is_empty());
    }

    #[test]
    fn remove_and_rebuild() {
        let mut index = ids(&["1", "2"]);
        assert!(index.remove(&"1".to_string()));
        assert!(!index.remove(&"1".to_string()));
        assert_eq!(page(&index, None, 10), vec!["2"]);

        index.rebuild(vec!["b".to_string(), "a".to_string()]);
        assert_eq!(page(&index, None, 10), vec!["a", "b"]);

        index.rebuild(Vec::new());
        assert!(index.is_empty());
    }
}
