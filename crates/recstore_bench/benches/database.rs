//! Database operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recstore_bench::utils::{drivers, generate_feedback, generate_users, populate};
use recstore_core::{Database, Feedback, User};

/// Benchmark single user upserts.
fn bench_insert_user(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_user");
    group.throughput(Throughput::Elements(1));

    for (name, db) in drivers() {
        group.bench_function(name, |b| {
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                db.insert_user(black_box(User::new(format!("user-{}", i % 10_000))))
                    .unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark feedback batches that create stub users and items.
fn bench_batch_feedback(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_feedback");

    for batch_size in [10, 100, 1000] {
        group.throughput(Throughput::Elements(batch_size as u64));
        for (name, db) in drivers() {
            let batch = generate_feedback(batch_size, 500, 500);
            group.bench_with_input(BenchmarkId::new(name, batch_size), &batch, |b, batch| {
                b.iter(|| {
                    db.batch_insert_feedback(black_box(batch.clone()), true, true)
                        .unwrap();
                });
            });
        }
    }
    group.finish();
}

/// Benchmark point reads on a populated database.
fn bench_get_user(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_user");

    for (name, db) in drivers() {
        db.batch_insert_user(generate_users(10_000)).unwrap();
        group.bench_function(name, |b| {
            let mut i = 0u64;
            b.iter(|| {
                i = (i + 7919) % 10_000;
                black_box(db.get_user(&format!("user-{i:08}")).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark walking a whole listing at different page sizes.
fn bench_paginate(c: &mut Criterion) {
    let mut group = c.benchmark_group("paginate_feedback");
    group.throughput(Throughput::Elements(10_000));

    for (name, db) in drivers() {
        populate(db.as_ref(), 1_000, 1_000, 10_000);
        for page_size in [10, 100, 1000] {
            group.bench_with_input(
                BenchmarkId::new(name, page_size),
                &page_size,
                |b, &page_size| {
                    b.iter(|| {
                        let mut cursor = String::new();
                        let mut seen = 0;
                        loop {
                            let (next, page) = db.get_feedback(&cursor, page_size, None).unwrap();
                            seen += page.len();
                            if next.is_empty() {
                                break;
                            }
                            cursor = next;
                        }
                        black_box(seen)
                    });
                },
            );
        }
    }
    group.finish();
}

/// Benchmark per-user feedback lookups.
fn bench_user_feedback(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_user_feedback");

    for (name, db) in drivers() {
        populate(db.as_ref(), 1_000, 1_000, 20_000);
        group.bench_function(name, |b| {
            let mut i = 0u64;
            b.iter(|| {
                i = (i + 31) % 1_000;
                black_box(
                    db.get_user_feedback(&format!("user-{i:08}"), Some("click"))
                        .unwrap(),
                );
            });
        });
    }
    group.finish();
}

/// Benchmark deleting a user together with its feedback.
fn bench_cascade_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_delete");

    for fan_out in [10, 100, 1000] {
        group.throughput(Throughput::Elements(fan_out as u64));
        for (name, db) in drivers() {
            populate(db.as_ref(), 100, 2_000, 5_000);
            let feedback: Vec<Feedback> = (0..fan_out)
                .map(|i| Feedback::new("click", "victim", format!("item-{i:08}")))
                .collect();
            group.bench_with_input(BenchmarkId::new(name, fan_out), &feedback, |b, feedback| {
                b.iter(|| {
                    db.batch_insert_feedback(feedback.clone(), true, false)
                        .unwrap();
                    db.delete_user(black_box("victim")).unwrap();
                });
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_user,
    bench_batch_feedback,
    bench_get_user,
    bench_paginate,
    bench_user_feedback,
    bench_cascade_delete,
);

criterion_main!(benches);
