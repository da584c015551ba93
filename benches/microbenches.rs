//! Criterion microbenches for cocokit parsing and merging.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use cocokit::dataset::io_coco_json::{from_coco_slice, from_coco_str, to_coco_string};
use cocokit::merge::{merge, merge_many};

// Fixtures are compiled in so that no file I/O happens while measuring.
const FIXTURE_1: &str = include_str!("../tests/fixtures/coco_example_1.json");
const FIXTURE_2: &str = include_str!("../tests/fixtures/coco_example_2.json");

fn bench_coco_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("coco_parse");
    group.throughput(Throughput::Bytes(FIXTURE_1.len() as u64));

    group.bench_function("from_coco_str", |b| {
        b.iter(|| {
            let ds = from_coco_str(black_box(FIXTURE_1)).unwrap();
            black_box(ds)
        })
    });

    group.bench_function("from_coco_slice", |b| {
        b.iter(|| {
            let ds = from_coco_slice(black_box(FIXTURE_1.as_bytes())).unwrap();
            black_box(ds)
        })
    });

    group.finish();
}

fn bench_coco_write(c: &mut Criterion) {
    let dataset = from_coco_str(FIXTURE_1).unwrap();

    c.bench_function("to_coco_string", |b| {
        b.iter(|| {
            let json = to_coco_string(black_box(&dataset)).unwrap();
            black_box(json)
        })
    });
}

/// Merging the two fixtures, and a longer fold of the same pair repeated so
/// that most category names are reused.
fn bench_merge(c: &mut Criterion) {
    let first = from_coco_str(FIXTURE_1).unwrap();
    let second = from_coco_str(FIXTURE_2).unwrap();
    let many: Vec<_> = (0..32)
        .map(|i| if i % 2 == 0 { &first } else { &second })
        .collect();

    let mut group = c.benchmark_group("merge");

    group.bench_function("pair", |b| {
        b.iter(|| {
            let merged = merge(black_box(&first), black_box(&second)).unwrap();
            black_box(merged)
        })
    });

    group.throughput(Throughput::Elements(many.len() as u64));
    group.bench_function("fold_32", |b| {
        b.iter(|| {
            let merged = merge_many(black_box(many.iter().copied())).unwrap();
            black_box(merged)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_coco_parse, bench_coco_write, bench_merge);
criterion_main!(benches);
