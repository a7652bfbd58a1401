//! Stress tests for recstore drivers.
//!
//! These tests verify behavior under heavy load and concurrent access.

use recstore_core::{Database, Feedback, User};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Number of distinct users.
    pub user_count: usize,
    /// Number of distinct items.
    pub item_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            user_count: 100,
            item_count: 100,
        }
    }
}

#[derive(Default)]
struct Tally {
    successful: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn record<T, E>(&self, outcome: Result<T, E>) {
        let counter = if outcome.is_ok() {
            &self.successful
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self, start: Instant) -> StressTestResult {
        StressTestResult::new(
            self.successful.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            start.elapsed(),
        )
    }
}

/// Run a sequential feedback write stress test.
pub fn stress_sequential_writes(db: &dyn Database, config: &StressConfig) -> StressTestResult {
    let tally = Tally::default();
    let start = Instant::now();

    for i in 0..config.operations {
        let feedback = Feedback::new(
            "click",
            (i % config.user_count).to_string(),
            (i % config.item_count).to_string(),
        );
        tally.record(db.insert_feedback(feedback, true, true));
    }

    tally.finish(start)
}

/// Run a mixed read/write/delete stress test.
pub fn stress_mixed_operations(db: &dyn Database, config: &StressConfig) -> StressTestResult {
    let tally = Tally::default();
    let start = Instant::now();

    for i in 0..config.operations {
        let user = (i % config.user_count).to_string();
        let item = (i % config.item_count).to_string();
        match i % 4 {
            0 => tally.record(db.insert_feedback(Feedback::new("click", user, item), true, true)),
            1 => tally.record(db.get_user_feedback(&user, None)),
            2 => tally.record(db.get_item_feedback(&item, Some("click"))),
            _ => tally.record(db.delete_item(&item)),
        }
    }

    tally.finish(start)
}

/// Concurrently replaces the same users from every thread.
///
/// Each surviving user must carry exactly the fields one writer sent.
pub fn stress_concurrent_upserts(db: Arc<dyn Database>, config: &StressConfig) -> StressTestResult {
    let tally = Arc::new(Tally::default());
    let ops_per_thread = config.operations / config.threads.max(1);
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let tally = Arc::clone(&tally);
            let user_count = config.user_count;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let user = User::new((i % user_count).to_string())
                        .with_labels([format!("thread-{t}")])
                        .with_comment(format!("thread-{t}"));
                    tally.record(db.insert_user(user));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    for user in db.get_users("", config.user_count + 1).expect("get_users failed").1 {
        assert_eq!(user.labels, vec![user.comment.clone()], "fields were merged");
    }

    tally.finish(start)
}

/// Races feedback writers against deletes, then checks that no feedback
/// outlived its user or item.
pub fn stress_cascade_with_writers(db: Arc<dyn Database>, config: &StressConfig) -> StressTestResult {
    let tally = Arc::new(Tally::default());
    let ops_per_thread = config.operations / config.threads.max(1);
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let tally = Arc::clone(&tally);
            let (user_count, item_count) = (config.user_count, config.item_count);

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let user = ((i + t) % user_count).to_string();
                    let item = ((i * 7 + t) % item_count).to_string();
                    match (i + t) % 5 {
                        0 => tally.record(db.delete_user(&user)),
                        1 => tally.record(db.delete_item(&item)),
                        _ => tally.record(db.insert_feedback(
                            Feedback::new("view", user, item),
                            true,
                            true,
                        )),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let users: BTreeSet<String> = crate::conformance::collect_users(db.as_ref())
        .into_iter()
        .map(|u| u.user_id)
        .collect();
    let items: BTreeSet<String> = crate::conformance::collect_items(db.as_ref())
        .into_iter()
        .map(|i| i.item_id)
        .collect();
    for feedback in crate::conformance::collect_feedback(db.as_ref(), None) {
        assert!(users.contains(feedback.user_id()), "dangling user in {:?}", feedback.key);
        assert!(items.contains(feedback.item_id()), "dangling item in {:?}", feedback.key);
    }

    tally.finish(start)
}

/// Walks the user listing from several threads while others insert.
///
/// Every walk must terminate without errors.
pub fn stress_paginate_during_writes(
    db: Arc<dyn Database>,
    config: &StressConfig,
) -> StressTestResult {
    let tally = Arc::new(Tally::default());
    let writers = (config.threads / 2).max(1);
    let ops_per_thread = config.operations / config.threads.max(1);
    let start = Instant::now();

    let mut handles = Vec::new();
    for t in 0..writers {
        let db = Arc::clone(&db);
        let tally = Arc::clone(&tally);
        handles.push(thread::spawn(move || {
            for i in 0..ops_per_thread {
                tally.record(db.insert_user(User::new(format!("{t}-{i}"))));
            }
        }));
    }
    for _ in writers..config.threads.max(writers + 1) {
        let db = Arc::clone(&db);
        let tally = Arc::clone(&tally);
        handles.push(thread::spawn(move || {
            for _ in 0..(ops_per_thread / 50).max(1) {
                let mut cursor = String::new();
                loop {
                    match db.get_users(&cursor, 16) {
                        Ok((next, _)) => {
                            tally.record(Ok::<(), ()>(()));
                            if next.is_empty() {
                                break;
                            }
                            cursor = next;
                        }
                        Err(err) => {
                            tally.record(Err::<(), _>(err));
                            break;
                        }
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    tally.finish(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Driver;

    fn small() -> StressConfig {
        StressConfig {
            operations: 1_000,
            threads: 4,
            user_count: 20,
            item_count: 15,
        }
    }

    #[test]
    fn test_sequential_writes() {
        for driver in Driver::ALL {
            let db = driver.open();
            let result = stress_sequential_writes(db.as_ref(), &small());
            assert_eq!(result.failed_ops, 0, "{driver}");
            assert_eq!(result.successful_ops, 1_000);
            assert_eq!(db.get_feedback("", 1_000, None).unwrap().1.len(), 20 * 15 / 5);
        }
    }

    #[test]
    fn test_mixed_operations() {
        for driver in Driver::ALL {
            let db = driver.open();
            let result = stress_mixed_operations(db.as_ref(), &small());
            assert_eq!(result.failed_ops, 0, "{driver}");
        }
    }

    #[test]
    fn test_concurrent_upserts() {
        for driver in Driver::ALL {
            let result = stress_concurrent_upserts(Arc::from(driver.open()), &small());
            assert_eq!(result.failed_ops, 0, "{driver}");
        }
    }

    #[test]
    fn test_cascade_with_writers() {
        for driver in Driver::ALL {
            let result = stress_cascade_with_writers(Arc::from(driver.open()), &small());
            assert_eq!(result.failed_ops, 0, "{driver}");
        }
    }

    #[test]
    fn test_paginate_during_writes() {
        for driver in Driver::ALL {
            let result = stress_paginate_during_writes(Arc::from(driver.open()), &small());
            assert_eq!(result.failed_ops, 0, "{driver}");
            assert!(result.successful_ops > 0);
        }
    }
}
