//! Feedback records and their composite key.

use super::validate_id;
use crate::error::CoreResult;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one feedback record: `(feedback_type, user_id, item_id)`.
///
/// Keys order lexicographically by type, then user, then item. That order
/// is the listing order of `get_feedback`.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FeedbackKey {
    /// Caller-defined signal class, e.g. "positive".
    pub feedback_type: String,
    /// The user who gave the feedback.
    pub user_id: String,
    /// The item the feedback is about.
    pub item_id: String,
}

impl FeedbackKey {
    /// Creates a key.
    pub fn new(
        feedback_type: impl Into<String>,
        user_id: impl Into<String>,
        item_id: impl Into<String>,
    ) -> Self {
        Self {
            feedback_type: feedback_type.into(),
            user_id: user_id.into(),
            item_id: item_id.into(),
        }
    }

    /// Checks every component.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any component is empty or contains NUL.
    pub fn validate(&self) -> CoreResult<()> {
        validate_id("feedback_type", &self.feedback_type)?;
        validate_id("user_id", &self.user_id)?;
        validate_id("item_id", &self.item_id)
    }

    /// Returns the key as its three string components.
    #[must_use]
    pub fn to_parts(&self) -> Vec<String> {
        vec![
            self.feedback_type.clone(),
            self.user_id.clone(),
            self.item_id.clone(),
        ]
    }

    /// Rebuilds a key from [`FeedbackKey::to_parts`] output.
    #[must_use]
    pub fn from_parts(parts: &[String]) -> Option<Self> {
        match parts {
            [feedback_type, user_id, item_id] => {
                Some(Self::new(feedback_type, user_id, item_id))
            }
            _ => None,
        }
    }

    /// Returns true if this key has the given type, or `filter` is `None`.
    #[must_use]
    pub fn matches_type(&self, filter: Option<&str>) -> bool {
        filter.map_or(true, |t| self.feedback_type == t)
    }
}

impl fmt::Display for FeedbackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.feedback_type, self.user_id, self.item_id
        )
    }
}

/// One feedback record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Identity.
    pub key: FeedbackKey,
    /// When the feedback happened.
    #[serde(default)]
    pub timestamp: Timestamp,
    /// Free text.
    #[serde(default)]
    pub comment: String,
}

impl Feedback {
    /// Creates a feedback record with default timestamp and comment.
    pub fn new(
        feedback_type: impl Into<String>,
        user_id: impl Into<String>,
        item_id: impl Into<String>,
    ) -> Self {
        Self {
            key: FeedbackKey::new(feedback_type, user_id, item_id),
            ..Self::default()
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Shorthand for `self.key.user_id`.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.key.user_id
    }

    /// Shorthand for `self.key.item_id`.
    #[must_use]
    pub fn item_id(&self) -> &str {
        &self.key.item_id
    }

    /// Shorthand for `self.key.feedback_type`.
    #[must_use]
    pub fn feedback_type(&self) -> &str {
        &self.key.feedback_type
    }

    /// Checks the key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any key component is invalid.
    pub fn validate(&self) -> CoreResult<()> {
        self.key.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_is_type_user_item() {
        let mut keys = vec![
            FeedbackKey::new("b", "0", "0"),
            FeedbackKey::new("a", "1", "0"),
            FeedbackKey::new("a", "0", "9"),
            FeedbackKey::new("a", "0", "1"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                FeedbackKey::new("a", "0", "1"),
                FeedbackKey::new("a", "0", "9"),
                FeedbackKey::new("a", "1", "0"),
                FeedbackKey::new("b", "0", "0"),
            ]
        );
    }

    #[test]
    fn parts_roundtrip() {
        let key = FeedbackKey::new("click", "u", "i");
        assert_eq!(FeedbackKey::from_parts(&key.to_parts()), Some(key));
        assert_eq!(FeedbackKey::from_parts(&["only".to_string()]), None);
    }

    #[test]
    fn type_filter() {
        let key = FeedbackKey::new("click", "u", "i");
        assert!(key.matches_type(None));
        assert!(key.matches_type(Some("click")));
        assert!(!key.matches_type(Some("like")));
    }

    #[test]
    fn validation_checks_every_component() {
        assert!(Feedback::new("t", "u", "i").validate().is_ok());
        assert!(Feedback::new("", "u", "i").validate().is_err());
        assert!(Feedback::new("t", "", "i").validate().is_err());
        assert!(Feedback::new("t", "u", "").validate().is_err());
    }

    #[test]
    fn accessors() {
        let fb = Feedback::new("t", "u", "i").with_comment("c");
        assert_eq!(fb.feedback_type(), "t");
        assert_eq!(fb.user_id(), "u");
        assert_eq!(fb.item_id(), "i");
        assert_eq!(fb.comment, "c");
    }
}
