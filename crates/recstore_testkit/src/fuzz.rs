//! Fuzz testing harnesses for recstore.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks. Every target must return normally for
//! any input; a panic is a bug.

use crate::conformance::{collect_feedback, collect_items, collect_users};
use crate::fixtures::Driver;
use crate::generators::DbOperation;
use recstore_core::{Database, ErrorKind, Feedback, Item, KvDatabase, User};
use recstore_storage::{InMemoryBackend, KvBackend};

/// Fuzz target for cursor tokens.
///
/// Any string handed to a listing either resumes it or is rejected as an
/// invalid argument.
pub fn fuzz_cursor(data: &[u8]) {
    let token = String::from_utf8_lossy(data);
    for driver in Driver::ALL {
        let db = driver.open();
        db.insert_user(User::new("u")).expect("insert_user failed");
        let outcomes = [
            db.get_users(&token, 3).map(|_| ()),
            db.get_items(&token, 3).map(|_| ()),
            db.get_feedback(&token, 3, None).map(|_| ()),
            db.get_feedback(&token, 3, Some("t")).map(|_| ()),
        ];
        for outcome in outcomes {
            if let Err(err) = outcome {
                assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{driver}: {err}");
            }
        }
    }
}

/// Fuzz target for stored record bytes.
///
/// Whatever a backend returns for a record, reading it yields the record
/// or a backend error.
pub fn fuzz_stored_record(data: &[u8]) {
    let backend = InMemoryBackend::new();
    backend
        .put(b"recstore/user/u", data)
        .expect("put failed");
    backend
        .put(b"recstore/item/i", data)
        .expect("put failed");
    let db = KvDatabase::open(backend).expect("open failed");

    for outcome in [
        db.get_user("u").map(|_| ()),
        db.get_item("i").map(|_| ()),
        db.get_users("", 10).map(|_| ()),
    ] {
        if let Err(err) = outcome {
            assert_eq!(err.kind(), ErrorKind::Backend, "{err}");
        }
    }
}

/// Fuzz target for operation sequences.
///
/// Runs the decoded operations on every driver and checks that they
/// agree on each outcome and on the final contents.
pub fn fuzz_database_operations(data: &[u8]) {
    let ops = parse_sequence(data);
    let kv = Driver::Kv.open();
    let memory = Driver::Memory.open();
    for op in &ops {
        let left = op.apply(kv.as_ref()).map_err(|e| e.kind());
        let right = op.apply(memory.as_ref()).map_err(|e| e.kind());
        assert_eq!(left, right, "drivers diverged on {op:?}");
    }
    assert_same_contents(kv.as_ref(), memory.as_ref());
}

/// Asserts two databases hold the same users, items and feedback.
pub fn assert_same_contents(left: &dyn Database, right: &dyn Database) {
    assert_eq!(collect_users(left), collect_users(right), "users differ");
    assert_eq!(collect_items(left), collect_items(right), "items differ");
    assert_eq!(
        collect_feedback(left, None),
        collect_feedback(right, None),
        "feedback differs"
    );
}

/// Decodes fuzzer input into database operations.
///
/// Each operation is an opcode byte followed by its operands. Ids come
/// from a pool of eight, and one byte in eight of the pool maps to an
/// invalid (empty) id so that argument checking is exercised too.
pub fn parse_sequence(data: &[u8]) -> Vec<DbOperation> {
    const TYPES: [&str; 2] = ["click", "like"];

    fn id(byte: u8) -> String {
        match byte % 9 {
            8 => String::new(),
            n => n.to_string(),
        }
    }

    let mut ops = Vec::new();
    let mut bytes = data.iter().copied();
    while let Some(opcode) = bytes.next() {
        let op = match opcode % 5 {
            0 => match bytes.next() {
                Some(b) => DbOperation::InsertUser(User::new(id(b)).with_comment(format!("{opcode}"))),
                None => break,
            },
            1 => match bytes.next() {
                Some(b) => DbOperation::InsertItem(Item::new(id(b)).with_comment(format!("{opcode}"))),
                None => break,
            },
            2 => {
                let (Some(count), Some(flags)) = (bytes.next(), bytes.next()) else {
                    break;
                };
                let mut feedback = Vec::new();
                for _ in 0..=(count % 3) {
                    let (Some(t), Some(u), Some(i)) = (bytes.next(), bytes.next(), bytes.next())
                    else {
                        break;
                    };
                    feedback.push(Feedback::new(
                        TYPES[usize::from(t % 2)],
                        id(u),
                        id(i),
                    ));
                }
                DbOperation::InsertFeedback {
                    feedback,
                    insert_user: flags & 1 == 1,
                    insert_item: flags & 2 == 2,
                }
            }
            3 => match bytes.next() {
                Some(b) => DbOperation::DeleteUser(id(b)),
                None => break,
            },
            _ => match bytes.next() {
                Some(b) => DbOperation::DeleteItem(id(b)),
                None => break,
            },
        };
        ops.push(op);
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use recstore_codec::{Cursor, Position};
    use std::hash::{DefaultHasher, Hash, Hasher};

    /// Generate pseudo-random data for fuzzing based on a seed.
    fn generate_random_data(seed: u64, len: usize) -> Vec<u8> {
        let mut result = Vec::with_capacity(len);
        let mut state = seed;
        for _ in 0..len {
            let mut hasher = DefaultHasher::new();
            state.hash(&mut hasher);
            state = hasher.finish();
            result.push((state & 0xFF) as u8);
        }
        result
    }

    #[test]
    fn parse_empty_input() {
        assert!(parse_sequence(&[]).is_empty());
    }

    #[test]
    fn parse_truncated_input_stops() {
        // Feedback opcode with a count but no flags byte.
        assert!(parse_sequence(&[2, 0]).is_empty());
        assert_eq!(parse_sequence(&[0, 1, 3]).len(), 1);
    }

    #[test]
    fn parse_feedback_operands() {
        let ops = parse_sequence(&[2, 1, 3, 0, 1, 2, 1, 3, 4]);
        match &ops[..] {
            [DbOperation::InsertFeedback {
                feedback,
                insert_user,
                insert_item,
            }] => {
                assert_eq!(feedback.len(), 2);
                assert_eq!(feedback[0].feedback_type(), "click");
                assert_eq!(feedback[1].user_id(), "3");
                assert!(*insert_user && *insert_item);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn cursor_target_accepts_garbage() {
        fuzz_cursor(b"");
        fuzz_cursor(b"!!!");
        fuzz_cursor(&[0xff, 0xfe, 0x00]);
        for seed in 0..32 {
            fuzz_cursor(&generate_random_data(seed, 24));
        }
    }

    #[test]
    fn cursor_target_accepts_foreign_positions() {
        let tokens = [
            Cursor::new("users", Position::Offset(u64::MAX)),
            Cursor::new("users", Position::After(vec![])),
            Cursor::new("feedback", Position::After(vec!["a".into(); 5])),
            Cursor::new("feedback:t", Position::After(vec!["t".into(), "\0".into(), String::new()])),
        ];
        for cursor in tokens {
            fuzz_cursor(cursor.encode().unwrap().as_bytes());
        }
    }

    #[test]
    fn stored_record_target() {
        fuzz_stored_record(b"");
        fuzz_stored_record(&[0xa0]);
        for seed in 0..32 {
            fuzz_stored_record(&generate_random_data(seed, 48));
        }
    }

    #[test]
    fn operation_sequences_agree() {
        for seed in 0..64 {
            fuzz_database_operations(&generate_random_data(seed, 96));
        }
    }
}
