//! Entity model: users, items and feedback.
//!
//! Entities are plain values. Drivers hand out clones, so mutating a
//! returned entity never touches stored state.

mod feedback;
mod model;

pub use feedback::{Feedback, FeedbackKey};
pub use model::{Item, User};

use crate::error::{CoreError, CoreResult, EntityKind};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A primary entity (user or item) as drivers see it.
pub(crate) trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Which table the record lives in.
    const KIND: EntityKind;

    /// Returns the identity.
    fn id(&self) -> &str;

    /// Builds an identity-only record.
    fn stub(id: &str) -> Self;

    /// Checks the identity.
    fn validate(&self) -> CoreResult<()>;
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.user_id
    }

    fn stub(id: &str) -> Self {
        Self::new(id)
    }

    fn validate(&self) -> CoreResult<()> {
        User::validate(self)
    }
}

impl Record for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> &str {
        &self.item_id
    }

    fn stub(id: &str) -> Self {
        Self::new(id)
    }

    fn validate(&self) -> CoreResult<()> {
        Item::validate(self)
    }
}

/// Rejects identifiers the storage layer cannot key on.
///
/// Identifiers must be non-empty and free of NUL bytes, which drivers use
/// as a component separator.
pub(crate) fn validate_id(field: &str, value: &str) -> CoreResult<()> {
    if value.is_empty() {
        return Err(CoreError::invalid_argument(format!("{field} is empty")));
    }
    if value.contains('\0') {
        return Err(CoreError::invalid_argument(format!(
            "{field} contains a NUL byte"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stubs_carry_identity_only() {
        let user = <User as Record>::stub("u");
        assert_eq!(user, User::new("u"));
        assert_eq!(<Item as Record>::stub("i").id(), "i");
        assert_eq!(<Item as Record>::KIND, EntityKind::Item);
    }

    #[test]
    fn validate_id_rules() {
        assert!(validate_id("user_id", "42").is_ok());
        assert!(validate_id("user_id", "").is_err());
        assert!(validate_id("user_id", "a\0b").is_err());
    }
}
