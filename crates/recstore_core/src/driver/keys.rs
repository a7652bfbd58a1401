//! Backend key layout of the key/value driver.
//!
//! ```text
//! {prefix}/user/{user_id}                                      -> User
//! {prefix}/item/{item_id}                                      -> Item
//! {prefix}/feedback/{feedback_type}\0{user_id}\0{item_id}      -> Feedback
//! {prefix}/user_feedback/{user_id}\0{feedback_type}\0{item_id} -> empty
//! {prefix}/item_feedback/{item_id}\0{feedback_type}\0{user_id} -> empty
//! ```
//!
//! The two membership tables let the driver find every feedback record of
//! one user or item with a single prefix listing. Identifiers never contain
//! NUL, so every layout is injective and parses back to its parts.

use crate::entity::FeedbackKey;
use crate::error::EntityKind;

const SEPARATOR: u8 = 0;

/// Builds and parses backend keys under one namespace.
#[derive(Debug, Clone)]
pub(crate) struct KeyLayout {
    users: Vec<u8>,
    items: Vec<u8>,
    feedback: Vec<u8>,
    user_feedback: Vec<u8>,
    item_feedback: Vec<u8>,
}

impl KeyLayout {
    pub(crate) fn new(prefix: &str) -> Self {
        let table = |name: &str| format!("{prefix}/{name}/").into_bytes();
        Self {
            users: table("user"),
            items: table("item"),
            feedback: table("feedback"),
            user_feedback: table("user_feedback"),
            item_feedback: table("item_feedback"),
        }
    }

    /// Key prefix shared by every record of a table.
    pub(crate) fn table(&self, kind: EntityKind) -> &[u8] {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Item => &self.items,
        }
    }

    /// Key prefix shared by every membership entry of one side.
    pub(crate) fn membership_table(&self, kind: EntityKind) -> &[u8] {
        match kind {
            EntityKind::User => &self.user_feedback,
            EntityKind::Item => &self.item_feedback,
        }
    }

    pub(crate) fn entity(&self, kind: EntityKind, id: &str) -> Vec<u8> {
        join(self.table(kind), &[id])
    }

    /// Prefix of the feedback table, or of one type within it.
    pub(crate) fn feedback_prefix(&self, feedback_type: Option<&str>) -> Vec<u8> {
        match feedback_type {
            None => self.feedback.clone(),
            Some(t) => join(&self.feedback, &[t, ""]),
        }
    }

    pub(crate) fn feedback(&self, key: &FeedbackKey) -> Vec<u8> {
        join(
            &self.feedback,
            &[
                key.feedback_type.as_str(),
                key.user_id.as_str(),
                key.item_id.as_str(),
            ],
        )
    }

    /// Membership entry recording that `key` belongs to its user or item.
    pub(crate) fn membership(&self, kind: EntityKind, key: &FeedbackKey) -> Vec<u8> {
        let (owner, other) = match kind {
            EntityKind::User => (key.user_id.as_str(), key.item_id.as_str()),
            EntityKind::Item => (key.item_id.as_str(), key.user_id.as_str()),
        };
        join(
            self.membership_table(kind),
            &[owner, key.feedback_type.as_str(), other],
        )
    }

    /// Prefix of every membership entry of one user or item, optionally
    /// narrowed to one feedback type.
    pub(crate) fn membership_prefix(
        &self,
        kind: EntityKind,
        id: &str,
        feedback_type: Option<&str>,
    ) -> Vec<u8> {
        match feedback_type {
            None => join(self.membership_table(kind), &[id, ""]),
            Some(t) => join(self.membership_table(kind), &[id, t, ""]),
        }
    }

    pub(crate) fn parse_entity(&self, kind: EntityKind, raw: &[u8]) -> Option<String> {
        let id = raw.strip_prefix(self.table(kind))?;
        if id.is_empty() || id.contains(&SEPARATOR) {
            return None;
        }
        String::from_utf8(id.to_vec()).ok()
    }

    pub(crate) fn parse_feedback(&self, raw: &[u8]) -> Option<FeedbackKey> {
        let rest = raw.strip_prefix(self.feedback.as_slice())?;
        let [feedback_type, user_id, item_id] = split3(rest)?;
        Some(FeedbackKey::new(feedback_type, user_id, item_id))
    }

    pub(crate) fn parse_membership(&self, kind: EntityKind, raw: &[u8]) -> Option<FeedbackKey> {
        let rest = raw.strip_prefix(self.membership_table(kind))?;
        let [owner, feedback_type, other] = split3(rest)?;
        Some(match kind {
            EntityKind::User => FeedbackKey::new(feedback_type, owner, other),
            EntityKind::Item => FeedbackKey::new(feedback_type, other, owner),
        })
    }
}

fn join(table: &[u8], parts: &[&str]) -> Vec<u8> {
    let len = table.len() + parts.iter().map(|p| p.len() + 1).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.extend_from_slice(table);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.extend_from_slice(part.as_bytes());
    }
    key
}

fn split3(rest: &[u8]) -> Option<[String; 3]> {
    let mut parts = rest.split(|b| *b == SEPARATOR);
    let mut next = || -> Option<String> {
        let part = parts.next()?;
        if part.is_empty() {
            return None;
        }
        String::from_utf8(part.to_vec()).ok()
    };
    let split = [next()?, next()?, next()?];
    if parts.next().is_some() {
        return None;
    }
    Some(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_keys_roundtrip() {
        let layout = KeyLayout::new("rs");
        let key = layout.entity(EntityKind::User, "42");
        assert_eq!(key, b"rs/user/42");
        assert_eq!(
            layout.parse_entity(EntityKind::User, &key),
            Some("42".to_string())
        );
        assert_eq!(layout.parse_entity(EntityKind::Item, &key), None);
    }

    #[test]
    fn feedback_keys_roundtrip() {
        let layout = KeyLayout::new("rs");
        let key = FeedbackKey::new("click", "u/1", "i/2");
        let raw = layout.feedback(&key);
        assert!(raw.starts_with(&layout.feedback_prefix(None)));
        assert!(raw.starts_with(&layout.feedback_prefix(Some("click"))));
        assert!(!raw.starts_with(&layout.feedback_prefix(Some("clic"))));
        assert_eq!(layout.parse_feedback(&raw), Some(key));
    }

    #[test]
    fn membership_keys_roundtrip() {
        let layout = KeyLayout::new("rs");
        let key = FeedbackKey::new("click", "u", "i");

        let by_user = layout.membership(EntityKind::User, &key);
        assert_eq!(by_user, b"rs/user_feedback/u\0click\0i");
        assert!(by_user.starts_with(&layout.membership_prefix(EntityKind::User, "u", None)));
        assert!(by_user.starts_with(&layout.membership_prefix(
            EntityKind::User,
            "u",
            Some("click")
        )));
        assert_eq!(
            layout.parse_membership(EntityKind::User, &by_user),
            Some(key.clone())
        );

        let by_item = layout.membership(EntityKind::Item, &key);
        assert_eq!(by_item, b"rs/item_feedback/i\0click\0u");
        assert_eq!(layout.parse_membership(EntityKind::Item, &by_item), Some(key));
    }

    #[test]
    fn membership_prefix_does_not_match_longer_ids() {
        let layout = KeyLayout::new("rs");
        let other = layout.membership(EntityKind::User, &FeedbackKey::new("t", "u1", "i"));
        assert!(!other.starts_with(&layout.membership_prefix(EntityKind::User, "u", None)));
    }

    #[test]
    fn malformed_feedback_keys_are_rejected() {
        let layout = KeyLayout::new("rs");
        assert_eq!(layout.parse_feedback(b"rs/feedback/only"), None);
        assert_eq!(layout.parse_feedback(b"rs/feedback/a\0b"), None);
        assert_eq!(layout.parse_feedback(b"rs/feedback/a\0b\0c\0d"), None);
        assert_eq!(layout.parse_feedback(b"rs/feedback/a\0\0c"), None);
        assert_eq!(layout.parse_feedback(b"other/feedback/a\0b\0c"), None);
        assert_eq!(layout.parse_membership(EntityKind::User, b"rs/user_feedback/u"), None);
    }

    #[test]
    fn tables_do_not_share_prefixes() {
        let layout = KeyLayout::new("rs");
        let membership = layout.membership(EntityKind::User, &FeedbackKey::new("t", "u", "i"));
        assert!(!membership.starts_with(layout.table(EntityKind::User)));
        assert_eq!(layout.parse_entity(EntityKind::User, &membership), None);
    }

    #[test]
    fn prefixes_isolate_namespaces() {
        let a = KeyLayout::new("a");
        let b = KeyLayout::new("b");
        let key = a.entity(EntityKind::Item, "1");
        assert_eq!(b.parse_entity(EntityKind::Item, &key), None);
    }
}
