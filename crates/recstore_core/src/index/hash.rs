//! Hash index implementation.

use crate::index::traits::{Index, IndexKey};
use std::collections::{BTreeSet, HashMap};

/// Hash-based index from a key to an ordered set of members.
///
/// `HashIndex` is optimized for exact-match lookups, such as "every
/// feedback key given by this user". Members of one key come back in
/// ascending order so lookups are deterministic.
///
/// # Example
///
/// ```rust
/// use recstore_core::index::HashIndex;
///
/// let mut index: HashIndex<String, u32> = HashIndex::new("by_user");
/// index.insert("alice".to_string(), 2);
/// index.insert("alice".to_string(), 1);
///
/// assert_eq!(index.lookup_where(&"alice".to_string(), |_| true), vec![1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct HashIndex<K: IndexKey, V: IndexKey> {
    /// Index name.
    name: String,
    /// Key to members mapping.
    entries: HashMap<K, BTreeSet<V>>,
    /// Total member count.
    count: usize,
}

impl<K: IndexKey, V: IndexKey> HashIndex<K, V> {
    /// Creates a new hash index.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            count: 0,
        }
    }

    /// Adds a member under a key. Returns true if it was not present.
    pub fn insert(&mut self, key: K, member: V) -> bool {
        let inserted = self.entries.entry(key).or_default().insert(member);
        if inserted {
            self.count += 1;
        }
        inserted
    }

    /// Removes one member. Returns true if it was present.
    pub fn remove(&mut self, key: &K, member: &V) -> bool {
        if let Some(set) = self.entries.get_mut(key) {
            if set.remove(member) {
                self.count -= 1;
                if set.is_empty() {
                    self.entries.remove(key);
                }
                return true;
            }
        }
        false
    }

    /// Returns the members of a key accepted by `keep`, in ascending order.
    pub fn lookup_where<F>(&self, key: &K, keep: F) -> Vec<V>
    where
        F: Fn(&V) -> bool,
    {
        match self.entries.get(key) {
            Some(set) => set.iter().filter(|m| keep(m)).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Iterates over every `(key, member)` pair in unspecified key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .iter()
            .flat_map(|(k, set)| set.iter().map(move |m| (k, m)))
    }
}

impl<K: IndexKey, V: IndexKey> Index<K> for HashIndex<K, V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.count
    }
}
