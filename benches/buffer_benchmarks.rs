//! Benchmarks for the piece chain and the undo tree.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vise_buffer::{PieceChain, Text};

/// Generates a large text string for benchmarking.
fn generate_large_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("Line {}: This is a sample line of text for benchmarking purposes.\n", i))
        .collect()
}

/// Benchmarks chain creation.
fn bench_buffer_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_creation");

    for size in [100, 1000, 10000, 100000].iter() {
        let text = generate_large_text(*size);

        group.bench_with_input(BenchmarkId::new("open", size), &text, |b, text| {
            b.iter(|| {
                let chain = PieceChain::open(black_box(text.as_bytes()));
                black_box(chain)
            })
        });
    }

    group.finish();
}

/// Benchmarks insertion at various positions.
fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("insertion");

    let base_text = generate_large_text(10000);

    group.bench_function("insert_at_start", |b| {
        b.iter_with_setup(
            || PieceChain::open(base_text.as_bytes()),
            |mut chain| {
                chain.insert(0, black_box(b"inserted text")).unwrap();
                black_box(chain)
            },
        )
    });

    group.bench_function("insert_at_middle", |b| {
        b.iter_with_setup(
            || PieceChain::open(base_text.as_bytes()),
            |mut chain| {
                let mid = chain.len() / 2;
                chain.insert(mid, black_box(b"inserted text")).unwrap();
                black_box(chain)
            },
        )
    });

    // Typing: many small inserts, each right after the previous one.
    group.bench_function("type_1000_chars", |b| {
        b.iter_with_setup(
            || PieceChain::open(base_text.as_bytes()),
            |mut chain| {
                let mid = chain.len() / 2;
                for i in 0..1000 {
                    chain.insert(mid + i, black_box(b"x")).unwrap();
                }
                black_box(chain)
            },
        )
    });

    group.finish();
}

/// Benchmarks deletion operations.
fn bench_deletion(c: &mut Criterion) {
    let mut group = c.benchmark_group("deletion");

    let base_text = generate_large_text(10000);

    group.bench_function("delete_at_start", |b| {
        b.iter_with_setup(
            || PieceChain::open(base_text.as_bytes()),
            |mut chain| {
                chain.delete(0..100).unwrap();
                black_box(chain)
            },
        )
    });

    group.bench_function("delete_across_pieces", |b| {
        b.iter_with_setup(
            || {
                let mut chain = PieceChain::open(base_text.as_bytes());
                for i in 0..100 {
                    chain.insert(i * 1000, b"--").unwrap();
                }
                chain
            },
            |mut chain| {
                chain.delete(500..50_000).unwrap();
                black_box(chain)
            },
        )
    });

    group.finish();
}

/// Benchmarks undo and redo through the revision tree.
fn bench_undo_redo(c: &mut Criterion) {
    let mut group = c.benchmark_group("undo_redo");

    group.bench_function("undo_100_revisions", |b| {
        b.iter_with_setup(
            || {
                let mut text = Text::new();
                for i in 0..100 {
                    text.insert(i * 5, b"test ").unwrap();
                    text.commit(i * 5, i * 5 + 5).unwrap();
                }
                text
            },
            |mut text| {
                while text.undo().unwrap().is_some() {}
                black_box(text)
            },
        )
    });

    group.bench_function("earlier_later_100", |b| {
        b.iter_with_setup(
            || {
                let mut text = Text::new();
                for i in 0..100 {
                    text.insert(i * 5, b"test ").unwrap();
                    text.commit(i * 5, i * 5 + 5).unwrap();
                }
                text
            },
            |mut text| {
                text.earlier(100).unwrap();
                text.later(100).unwrap();
                black_box(text)
            },
        )
    });

    group.finish();
}

/// Benchmarks line navigation over a fragmented chain.
fn bench_line_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_access");

    let text = generate_large_text(100000);
    let mut chain = PieceChain::open(text.as_bytes());
    for i in 0..1000 {
        chain.insert(i * 4000, b"#").unwrap();
    }

    group.bench_function("line_start_of", |b| {
        b.iter(|| {
            let pos = chain.line_start_of(black_box(50000));
            black_box(pos)
        })
    });

    group.bench_function("count_lines", |b| {
        b.iter(|| black_box(chain.line_count()))
    });

    group.bench_function("read_middle", |b| {
        let mid = chain.len() / 2;
        b.iter(|| {
            let bytes = chain.read(black_box(mid..mid + 4096)).unwrap();
            black_box(bytes)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_buffer_creation,
    bench_insertion,
    bench_deletion,
    bench_undo_redo,
    bench_line_access,
);

criterion_main!(benches);
