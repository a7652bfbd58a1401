//! Users and items.

use super::validate_id;
use crate::error::CoreResult;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// A user.
///
/// Inserting a user with an existing id replaces the stored record
/// entirely; fields are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identity.
    pub user_id: String,
    /// Ordered tags.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Ordered subscriptions.
    #[serde(default)]
    pub subscribe: Vec<String>,
    /// Free text.
    #[serde(default)]
    pub comment: String,
}

impl User {
    /// Creates a user with only an identity.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Sets the labels.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the subscriptions.
    #[must_use]
    pub fn with_subscribe<I, S>(mut self, subscribe: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscribe = subscribe.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Checks the identity field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the id is empty or contains NUL.
    pub fn validate(&self) -> CoreResult<()> {
        validate_id("user_id", &self.user_id)
    }
}

/// An item.
///
/// Same replacement semantics as [`User`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identity.
    pub item_id: String,
    /// When the item was published.
    #[serde(default)]
    pub timestamp: Timestamp,
    /// Ordered tags.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Free text.
    #[serde(default)]
    pub comment: String,
}

impl Item {
    /// Creates an item with only an identity.
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            ..Self::default()
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the labels.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Checks the identity field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the id is empty or contains NUL.
    pub fn validate(&self) -> CoreResult<()> {
        validate_id("item_id", &self.item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_builder() {
        let user = User::new("1")
            .with_labels(["a", "b"])
            .with_subscribe(["x"])
            .with_comment("hi");
        assert_eq!(user.user_id, "1");
        assert_eq!(user.labels, vec!["a", "b"]);
        assert_eq!(user.subscribe, vec!["x"]);
        assert_eq!(user.comment, "hi");
    }

    #[test]
    fn stub_user_has_empty_attributes() {
        let user = User::new("7");
        assert!(user.labels.is_empty());
        assert!(user.subscribe.is_empty());
        assert!(user.comment.is_empty());
    }

    #[test]
    fn item_builder() {
        let ts = Timestamp::from_date(1996, 3, 15).unwrap();
        let item = Item::new("i").with_timestamp(ts).with_labels(["a"]);
        assert_eq!(item.timestamp, ts);
        assert_eq!(item.labels, vec!["a"]);
        assert!(item.validate().is_ok());
        assert!(Item::new("").validate().is_err());
    }
}
