//! Codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recstore_bench::utils::{generate_feedback, generate_items};
use recstore_codec::{from_cbor, to_cbor, Cursor, Position};
use recstore_core::{Feedback, Item};

/// Benchmark record encoding.
fn bench_encode_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_record");
    let item = generate_items(1).remove(0);
    let feedback = generate_feedback(1, 10, 10).remove(0);

    group.bench_function("item", |b| b.iter(|| black_box(to_cbor(black_box(&item)).unwrap())));
    group.bench_function("feedback", |b| {
        b.iter(|| black_box(to_cbor(black_box(&feedback)).unwrap()))
    });
    group.finish();
}

/// Benchmark record decoding.
fn bench_decode_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_record");
    let item = to_cbor(&generate_items(1).remove(0)).unwrap();
    let feedback = to_cbor(&generate_feedback(1, 10, 10).remove(0)).unwrap();

    group.throughput(Throughput::Bytes(item.len() as u64));
    group.bench_function("item", |b| {
        b.iter(|| black_box(from_cbor::<Item>(black_box(&item)).unwrap()))
    });
    group.throughput(Throughput::Bytes(feedback.len() as u64));
    group.bench_function("feedback", |b| {
        b.iter(|| black_box(from_cbor::<Feedback>(black_box(&feedback)).unwrap()))
    });
    group.finish();
}

/// Benchmark cursor tokens of growing key length.
fn bench_cursor(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor");

    for key_len in [8, 64, 512] {
        let cursor = Cursor::new(
            "feedback:click",
            Position::After(vec!["k".repeat(key_len); 3]),
        );
        let token = cursor.encode().unwrap();

        group.bench_with_input(BenchmarkId::new("encode", key_len), &cursor, |b, cursor| {
            b.iter(|| black_box(cursor.encode().unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decode", key_len), &token, |b, token| {
            b.iter(|| black_box(Cursor::decode_for(token, "feedback:click").unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode_records, bench_decode_records, bench_cursor);
criterion_main!(benches);
