//! Pagination helpers shared by drivers.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use recstore_codec::{Cursor, Position};
use tracing::warn;

/// Cursor scope of `get_users`.
pub(crate) const USERS_SCOPE: &str = "users";

/// Cursor scope of `get_items`.
pub(crate) const ITEMS_SCOPE: &str = "items";

/// Cursor scope of `get_feedback` for the given filter.
pub(crate) fn feedback_scope(feedback_type: Option<&str>) -> String {
    match feedback_type {
        None => "feedback".to_string(),
        Some(t) => format!("feedback:{t}"),
    }
}

/// Rejects a zero limit and clamps oversized ones.
pub(crate) fn check_limit(config: &Config, limit: usize) -> CoreResult<usize> {
    if limit == 0 {
        return Err(CoreError::invalid_argument("limit must be positive"));
    }
    if limit > config.max_page_size {
        warn!(limit, max = config.max_page_size, "clamping page size");
        return Ok(config.max_page_size);
    }
    Ok(limit)
}

/// Rejects batches larger than the configured maximum.
pub(crate) fn check_batch(config: &Config, len: usize) -> CoreResult<()> {
    if len > config.max_batch_size {
        return Err(CoreError::invalid_argument(format!(
            "batch of {len} exceeds maximum of {}",
            config.max_batch_size
        )));
    }
    Ok(())
}

/// Decodes the resume position of a listing.
pub(crate) fn resume(cursor: &str, scope: &str) -> CoreResult<Option<Position>> {
    Ok(Cursor::decode_for(cursor, scope)?)
}

/// Encodes the token handed back with a page. `None` ends the listing.
pub(crate) fn next_token(scope: &str, position: Option<Position>) -> CoreResult<String> {
    match position {
        None => Ok(String::new()),
        Some(position) => Ok(Cursor::new(scope, position).encode()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn limit_rules() {
        let config = Config::new().max_page_size(10);
        assert_eq!(check_limit(&config, 0).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(check_limit(&config, 3).unwrap(), 3);
        assert_eq!(check_limit(&config, 50).unwrap(), 10);
    }

    #[test]
    fn batch_rules() {
        let config = Config::new().max_batch_size(2);
        assert!(check_batch(&config, 2).is_ok());
        assert!(check_batch(&config, 3).is_err());
    }

    #[test]
    fn scopes_differ_per_filter() {
        assert_ne!(feedback_scope(None), feedback_scope(Some("a")));
        assert_ne!(feedback_scope(Some("a")), feedback_scope(Some("b")));
    }

    #[test]
    fn token_roundtrip_through_scope() {
        let token = next_token(USERS_SCOPE, Some(Position::Offset(4))).unwrap();
        assert_eq!(resume(&token, USERS_SCOPE).unwrap(), Some(Position::Offset(4)));
        assert_eq!(
            resume(&token, ITEMS_SCOPE).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(next_token(USERS_SCOPE, None).unwrap(), "");
        assert_eq!(resume("", USERS_SCOPE).unwrap(), None);
    }
}
