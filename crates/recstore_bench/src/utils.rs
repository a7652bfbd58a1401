//! Benchmark utilities.

use rand::seq::SliceRandom;
use rand::Rng;
use recstore_core::{Database, Feedback, Item, KvDatabase, MemoryDatabase, Timestamp, User};
use recstore_storage::InMemoryBackend;

/// Feedback types the generators draw from.
pub const FEEDBACK_TYPES: [&str; 3] = ["click", "like", "read"];

/// Generate a random lowercase label.
pub fn random_label<R: Rng>(rng: &mut R) -> String {
    (0..rng.gen_range(3..10))
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect()
}

/// Generate `count` users with random labels, in shuffled order.
pub fn generate_users(count: usize) -> Vec<User> {
    let mut rng = rand::thread_rng();
    let mut users: Vec<User> = (0..count)
        .map(|i| {
            User::new(format!("user-{i:08}"))
                .with_labels((0..3).map(|_| random_label(&mut rng)).collect::<Vec<_>>())
        })
        .collect();
    users.shuffle(&mut rng);
    users
}

/// Generate `count` items with random labels and timestamps.
pub fn generate_items(count: usize) -> Vec<Item> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            Item::new(format!("item-{i:08}"))
                .with_timestamp(Timestamp::from_millis(rng.gen_range(0..1_700_000_000_000)))
                .with_labels((0..3).map(|_| random_label(&mut rng)).collect::<Vec<_>>())
        })
        .collect()
}

/// Generate `count` feedback records between random users and items.
pub fn generate_feedback(count: usize, users: usize, items: usize) -> Vec<Feedback> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            Feedback::new(
                FEEDBACK_TYPES[rng.gen_range(0..FEEDBACK_TYPES.len())],
                format!("user-{:08}", rng.gen_range(0..users)),
                format!("item-{:08}", rng.gen_range(0..items)),
            )
        })
        .collect()
}

/// Every driver under a short name.
pub fn drivers() -> Vec<(&'static str, Box<dyn Database>)> {
    let kv: Box<dyn Database> =
        Box::new(KvDatabase::open(InMemoryBackend::new()).expect("open failed"));
    let memory: Box<dyn Database> = Box::new(MemoryDatabase::new());
    vec![("kv", kv), ("memory", memory)]
}

/// Fill `db` with users, items and feedback.
pub fn populate(db: &dyn Database, users: usize, items: usize, feedback: usize) {
    db.batch_insert_user(generate_users(users))
        .expect("insert users failed");
    db.batch_insert_item(generate_items(items))
        .expect("insert items failed");
    db.batch_insert_feedback(generate_feedback(feedback, users, items), false, false)
        .expect("insert feedback failed");
}
