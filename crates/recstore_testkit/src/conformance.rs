//! Behavioural suite every [`Database`] driver must pass.
//!
//! Each check expects a fresh, empty database and panics on the first
//! violation. [`run_all`] opens one database per check.
//!
//! Listings are always walked two records at a time so that cursor
//! handling is exercised on every check: every page before the last must
//! be full, and the last page must not be.

use recstore_core::{Database, EntityKind, ErrorKind, Feedback, Item, Timestamp, User};

/// Page size used when walking listings.
pub const PAGE_SIZE: usize = 2;

const POSITIVE: &str = "positiveFeedbackType";
const NEGATIVE: &str = "negativeFeedbackType";

fn fixed_time() -> Timestamp {
    Timestamp::from_date(1996, 3, 15).expect("valid date")
}

fn walk<T>(mut next: impl FnMut(&str) -> (String, Vec<T>)) -> Vec<T> {
    let mut all = Vec::new();
    let mut cursor = String::new();
    loop {
        let (token, page) = next(cursor.as_str());
        if token.is_empty() {
            assert!(page.len() <= PAGE_SIZE, "last page too large");
            all.extend(page);
            return all;
        }
        assert_eq!(page.len(), PAGE_SIZE, "non-final page must be full");
        all.extend(page);
        cursor = token;
    }
}

/// Collects every user, page by page.
pub fn collect_users(db: &dyn Database) -> Vec<User> {
    walk(|cursor| db.get_users(cursor, PAGE_SIZE).expect("get_users failed"))
}

/// Collects every item, page by page.
pub fn collect_items(db: &dyn Database) -> Vec<Item> {
    walk(|cursor| db.get_items(cursor, PAGE_SIZE).expect("get_items failed"))
}

/// Collects every feedback record of `feedback_type` (all if `None`).
pub fn collect_feedback(db: &dyn Database, feedback_type: Option<&str>) -> Vec<Feedback> {
    walk(|cursor| {
        db.get_feedback(cursor, PAGE_SIZE, feedback_type)
            .expect("get_feedback failed")
    })
}

fn five_positive(users: [&str; 5], items: [&str; 5]) -> Vec<Feedback> {
    users
        .iter()
        .zip(items)
        .map(|(user, item)| {
            Feedback::new(POSITIVE, *user, item)
                .with_timestamp(fixed_time())
                .with_comment("comment")
        })
        .collect()
}

/// Insert, list, get, delete and override users.
pub fn test_users(db: &dyn Database) {
    for i in (0..10).rev() {
        db.insert_user(
            User::new(i.to_string())
                .with_labels([(i + 100).to_string()])
                .with_comment(format!("comment {i}")),
        )
        .expect("insert_user failed");
    }

    let users = collect_users(db);
    assert_eq!(users.len(), 10);
    for (i, user) in users.iter().enumerate() {
        assert_eq!(user.user_id, i.to_string());
        assert_eq!(user.labels, vec![(i + 100).to_string()]);
        assert_eq!(user.comment, format!("comment {i}"));
    }

    assert_eq!(db.get_user("0").expect("get_user failed").user_id, "0");
    db.delete_user("0").expect("delete_user failed");
    assert_eq!(db.get_user("0").unwrap_err().kind(), ErrorKind::NotFound);

    db.insert_user(User::new("1").with_comment("override"))
        .expect("insert_user failed");
    let user = db.get_user("1").expect("get_user failed");
    assert_eq!(user.comment, "override");
    assert!(user.labels.is_empty(), "override must replace, not merge");
}

/// Insert, list, get, delete and override items.
pub fn test_items(db: &dyn Database) {
    let specs: [(&str, &[&str]); 5] = [
        ("0", &["a"]),
        ("2", &["a"]),
        ("4", &["a", "b"]),
        ("6", &["b"]),
        ("8", &["b"]),
    ];
    let items: Vec<Item> = specs
        .into_iter()
        .map(|(id, labels)| {
            Item::new(id)
                .with_timestamp(fixed_time())
                .with_labels(labels.iter().copied())
                .with_comment(format!("comment {id}"))
        })
        .collect();

    db.batch_insert_item(items[1..].to_vec())
        .expect("batch_insert_item failed");
    db.insert_item(items[0].clone()).expect("insert_item failed");

    assert_eq!(collect_items(db), items);
    for item in &items {
        assert_eq!(&db.get_item(&item.item_id).expect("get_item failed"), item);
    }

    db.delete_item("0").expect("delete_item failed");
    assert_eq!(db.get_item("0").unwrap_err().kind(), ErrorKind::NotFound);

    db.insert_item(Item::new("2").with_comment("override"))
        .expect("insert_item failed");
    let item = db.get_item("2").expect("get_item failed");
    assert_eq!(item.comment, "override");
    assert_eq!(item.timestamp, Timestamp::EPOCH);
}

/// Feedback insertion, typed listing, stubs, per-user and per-item
/// lookups, and override.
pub fn test_feedback(db: &dyn Database) {
    let existing_user = User::new("0")
        .with_labels(["a"])
        .with_subscribe(["x"])
        .with_comment("comment");
    let existing_item = Item::new("0").with_labels(["b"]);
    db.insert_user(existing_user.clone())
        .expect("insert_user failed");
    db.insert_item(existing_item.clone())
        .expect("insert_item failed");

    let feedback = five_positive(["0", "1", "2", "3", "4"], ["0", "2", "4", "6", "8"]);
    db.batch_insert_feedback(feedback[1..].to_vec(), true, true)
        .expect("batch_insert_feedback failed");
    db.insert_feedback(feedback[0].clone(), true, true)
        .expect("insert_feedback failed");
    db.insert_feedback(Feedback::new(NEGATIVE, "0", "2"), true, true)
        .expect("insert_feedback failed");
    db.insert_feedback(Feedback::new(NEGATIVE, "2", "4"), true, true)
        .expect("insert_feedback failed");

    assert_eq!(collect_feedback(db, Some(POSITIVE)), feedback);
    assert_eq!(collect_feedback(db, None).len(), feedback.len() + 2);

    let items = collect_items(db);
    assert_eq!(
        items.iter().map(|i| i.item_id.as_str()).collect::<Vec<_>>(),
        ["0", "2", "4", "6", "8"]
    );
    let users = collect_users(db);
    assert_eq!(
        users.iter().map(|u| u.user_id.as_str()).collect::<Vec<_>>(),
        ["0", "1", "2", "3", "4"]
    );

    // Stubs never replace existing entities.
    assert_eq!(db.get_user("0").expect("get_user failed"), existing_user);
    assert_eq!(db.get_item("0").expect("get_item failed"), existing_item);

    let ret = db
        .get_user_feedback("2", Some(POSITIVE))
        .expect("get_user_feedback failed");
    assert_eq!(ret.len(), 1);
    assert_eq!((ret[0].user_id(), ret[0].item_id()), ("2", "4"));
    assert_eq!(db.get_user_feedback("2", None).expect("get_user_feedback failed").len(), 2);

    let ret = db
        .get_item_feedback("4", Some(POSITIVE))
        .expect("get_item_feedback failed");
    assert_eq!(ret.len(), 1);
    assert_eq!((ret[0].user_id(), ret[0].item_id()), ("2", "4"));
    assert_eq!(db.get_item_feedback("4", None).expect("get_item_feedback failed").len(), 2);

    db.insert_feedback(
        Feedback::new(POSITIVE, "0", "0").with_comment("override"),
        true,
        true,
    )
    .expect("insert_feedback failed");
    let ret = db
        .get_user_feedback("0", Some(POSITIVE))
        .expect("get_user_feedback failed");
    assert_eq!(ret.len(), 1);
    assert_eq!(ret[0].comment, "override");
    assert_eq!(collect_feedback(db, None).len(), feedback.len() + 2);
}

/// Deleting a user removes its feedback and nothing else.
pub fn test_delete_user(db: &dyn Database) {
    let feedback = five_positive(["0"; 5], ["0", "2", "4", "6", "8"]);
    db.batch_insert_feedback(feedback, true, true)
        .expect("batch_insert_feedback failed");

    db.delete_user("0").expect("delete_user failed");
    assert_eq!(db.get_user("0").unwrap_err().kind(), ErrorKind::NotFound);
    assert!(db
        .get_user_feedback("0", Some(POSITIVE))
        .expect("get_user_feedback failed")
        .is_empty());
    let (_, ret) = db
        .get_feedback("", 100, Some(POSITIVE))
        .expect("get_feedback failed");
    assert!(ret.is_empty());
    assert_eq!(collect_items(db).len(), 5, "items survive a user delete");
}

/// Deleting an item removes its feedback and nothing else.
pub fn test_delete_item(db: &dyn Database) {
    let feedback = five_positive(["0", "1", "2", "3", "4"], ["0"; 5]);
    db.batch_insert_feedback(feedback, true, true)
        .expect("batch_insert_feedback failed");

    db.delete_item("0").expect("delete_item failed");
    assert_eq!(db.get_item("0").unwrap_err().kind(), ErrorKind::NotFound);
    assert!(db
        .get_item_feedback("0", Some(POSITIVE))
        .expect("get_item_feedback failed")
        .is_empty());
    let (_, ret) = db
        .get_feedback("", 100, Some(POSITIVE))
        .expect("get_feedback failed");
    assert!(ret.is_empty());
    assert_eq!(collect_users(db).len(), 5, "users survive an item delete");
}

/// Per-user and per-item lookups agree with the global listing.
pub fn test_cross_index(db: &dyn Database) {
    let mut batch = Vec::new();
    for u in 0..4 {
        for i in 0..3 {
            if (u + i) % 2 == 0 {
                batch.push(Feedback::new(POSITIVE, u.to_string(), i.to_string()));
            }
            if u == i {
                batch.push(Feedback::new(NEGATIVE, u.to_string(), i.to_string()));
            }
        }
    }
    db.batch_insert_feedback(batch, true, true)
        .expect("batch_insert_feedback failed");

    let all = collect_feedback(db, None);
    let mut sorted = all.clone();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));
    assert_eq!(all, sorted, "global listing must be ascending by key");

    for filter in [None, Some(POSITIVE), Some(NEGATIVE)] {
        let matching = |f: &&Feedback| filter.map_or(true, |t| f.feedback_type() == t);
        assert_eq!(
            collect_feedback(db, filter),
            all.iter().filter(matching).cloned().collect::<Vec<_>>()
        );
        for u in 0..4 {
            let id = u.to_string();
            let mut got = db
                .get_user_feedback(&id, filter)
                .expect("get_user_feedback failed");
            got.sort_by(|a, b| a.key.cmp(&b.key));
            let want: Vec<_> = all
                .iter()
                .filter(matching)
                .filter(|f| f.user_id() == id)
                .cloned()
                .collect();
            assert_eq!(got, want);
        }
        for i in 0..3 {
            let id = i.to_string();
            let mut got = db
                .get_item_feedback(&id, filter)
                .expect("get_item_feedback failed");
            got.sort_by(|a, b| a.key.cmp(&b.key));
            let want: Vec<_> = all
                .iter()
                .filter(matching)
                .filter(|f| f.item_id() == id)
                .cloned()
                .collect();
            assert_eq!(got, want);
        }
    }
}

/// Missing references are rejected unless auto-creation is requested,
/// and a rejected batch writes nothing.
pub fn test_auto_create(db: &dyn Database) {
    let err = db
        .insert_feedback(Feedback::new(POSITIVE, "u", "i"), false, true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    let err = db
        .insert_feedback(Feedback::new(POSITIVE, "u", "i"), true, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    assert!(db.get_user("u").unwrap_err().is_not_found());
    assert!(db.get_item("i").unwrap_err().is_not_found());
    assert!(collect_feedback(db, None).is_empty());

    db.insert_user(User::new("u")).expect("insert_user failed");
    let err = db
        .batch_insert_feedback(
            vec![
                Feedback::new(POSITIVE, "u", "a"),
                Feedback::new(POSITIVE, "v", "a"),
            ],
            false,
            true,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        recstore_core::CoreError::ReferenceNotFound {
            kind: EntityKind::User,
            ref id,
        } if id == "v"
    ));
    assert!(collect_feedback(db, None).is_empty(), "batch must be all-or-nothing");
    assert!(db.get_item("a").unwrap_err().is_not_found());

    db.insert_feedback(Feedback::new(POSITIVE, "u", "i"), false, true)
        .expect("insert_feedback failed");
    assert_eq!(db.get_item("i").expect("get_item failed"), Item::new("i"));
    db.insert_feedback(Feedback::new(POSITIVE, "w", "i"), true, false)
        .expect("insert_feedback failed");
    assert_eq!(db.get_user("w").expect("get_user failed"), User::new("w"));
}

/// Listings over an empty database and over exact multiples of the page.
pub fn test_pagination_edges(db: &dyn Database) {
    assert_eq!(db.get_users("", PAGE_SIZE).expect("get_users failed"), (String::new(), vec![]));
    assert_eq!(
        db.get_feedback("", PAGE_SIZE, Some(POSITIVE))
            .expect("get_feedback failed"),
        (String::new(), vec![])
    );

    db.batch_insert_user((0..4).map(|i| User::new(i.to_string())).collect())
        .expect("batch_insert_user failed");
    let (cursor, page) = db.get_users("", 4).expect("get_users failed");
    assert_eq!(page.len(), 4);
    assert!(cursor.is_empty(), "a page that drains the listing ends it");
    assert_eq!(collect_users(db).len(), 4);

    // A large limit returns everything at once.
    let (cursor, page) = db.get_users("", 1_000).expect("get_users failed");
    assert!(cursor.is_empty());
    assert_eq!(page.len(), 4);

    // Deleting an absent id is not an error.
    db.delete_user("missing").expect("delete_user failed");
    db.delete_item("missing").expect("delete_item failed");
}

/// Bad limits, cursors and identifiers are rejected.
pub fn test_invalid_arguments(db: &dyn Database) {
    let invalid = |kind: ErrorKind| assert_eq!(kind, ErrorKind::InvalidArgument);

    invalid(db.get_users("", 0).unwrap_err().kind());
    invalid(db.get_items("", 0).unwrap_err().kind());
    invalid(db.get_feedback("", 0, None).unwrap_err().kind());
    invalid(db.get_users("not a cursor", 2).unwrap_err().kind());

    db.batch_insert_user((0..3).map(|i| User::new(i.to_string())).collect())
        .expect("batch_insert_user failed");
    db.batch_insert_item((0..3).map(|i| Item::new(i.to_string())).collect())
        .expect("batch_insert_item failed");
    db.batch_insert_feedback(
        vec![
            Feedback::new(POSITIVE, "0", "0"),
            Feedback::new(POSITIVE, "1", "1"),
            Feedback::new(POSITIVE, "2", "2"),
        ],
        false,
        false,
    )
    .expect("batch_insert_feedback failed");

    let (users_cursor, _) = db.get_users("", 2).expect("get_users failed");
    let (typed_cursor, _) = db
        .get_feedback("", 2, Some(POSITIVE))
        .expect("get_feedback failed");
    assert!(!users_cursor.is_empty());
    assert!(!typed_cursor.is_empty());

    invalid(db.get_items(&users_cursor, 2).unwrap_err().kind());
    invalid(db.get_feedback(&users_cursor, 2, None).unwrap_err().kind());
    invalid(db.get_feedback(&typed_cursor, 2, None).unwrap_err().kind());
    invalid(
        db.get_feedback(&typed_cursor, 2, Some(NEGATIVE))
            .unwrap_err()
            .kind(),
    );

    invalid(db.insert_user(User::new("")).unwrap_err().kind());
    invalid(db.insert_item(Item::new("a\0b")).unwrap_err().kind());
    invalid(
        db.insert_feedback(Feedback::new("", "0", "0"), true, true)
            .unwrap_err()
            .kind(),
    );
    invalid(db.get_user("").unwrap_err().kind());
    invalid(
        db.batch_insert_user(vec![User::new("ok"), User::new("")])
            .unwrap_err()
            .kind(),
    );
    assert!(db.get_user("ok").unwrap_err().is_not_found(), "rejected batch wrote");
}

/// Runs every check, each on a fresh database from `open`.
pub fn run_all<F>(mut open: F)
where
    F: FnMut() -> Box<dyn Database>,
{
    let checks: [(&str, fn(&dyn Database)); 9] = [
        ("users", test_users),
        ("items", test_items),
        ("feedback", test_feedback),
        ("delete_user", test_delete_user),
        ("delete_item", test_delete_item),
        ("cross_index", test_cross_index),
        ("auto_create", test_auto_create),
        ("pagination_edges", test_pagination_edges),
        ("invalid_arguments", test_invalid_arguments),
    ];
    for (name, check) in checks {
        tracing::debug!(check = name, "running conformance check");
        check(open().as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{init_tracing, Driver};

    macro_rules! per_driver {
        ($($check:ident),* $(,)?) => {
            mod kv {
                use super::*;
                $(
                    #[test]
                    fn $check() {
                        init_tracing();
                        super::$check(Driver::Kv.open().as_ref());
                    }
                )*
            }

            mod memory {
                use super::*;
                $(
                    #[test]
                    fn $check() {
                        init_tracing();
                        super::$check(Driver::Memory.open().as_ref());
                    }
                )*
            }
        };
    }

    per_driver!(
        test_users,
        test_items,
        test_feedback,
        test_delete_user,
        test_delete_item,
        test_cross_index,
        test_auto_create,
        test_pagination_edges,
        test_invalid_arguments,
    );

    #[test]
    fn run_all_on_every_driver() {
        for driver in Driver::ALL {
            run_all(|| driver.open());
        }
    }
}
