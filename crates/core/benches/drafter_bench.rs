//! Criterion benchmarks for the drafting components.
//!
//! Measures the cost of one unthrottled `draft` call over histories of
//! realistic lengths. The histories are synthetic but repetitive, built from
//! a small set of token blocks so that the backward scans actually find
//! matches and the keyed map exercises its statistics path.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lookahead_core::drafter::{
    KeyedNgramConfig, KeyedNgramMap, SimpleNgramConfig, SimpleNgramDrafter,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a repetitive token history of the given length: random draws from a
/// small set of 8-token blocks, seeded for determinism.
fn make_history(len: usize) -> Vec<u32> {
    const BLOCKS: [[u32; 8]; 4] = [
        [10, 11, 12, 13, 14, 15, 16, 17],
        [20, 21, 22, 23, 24, 25, 26, 27],
        [10, 11, 12, 13, 34, 35, 36, 37],
        [40, 41, 42, 43, 44, 45, 46, 47],
    ];
    let mut rng = StdRng::seed_from_u64(42);
    let mut history = Vec::with_capacity(len + 8);
    while history.len() < len {
        let block = BLOCKS[rng.gen_range(0..BLOCKS.len())];
        history.extend_from_slice(&block);
    }
    history.truncate(len);
    history
}

// ---------------------------------------------------------------------------
// Simple n-gram drafter
// ---------------------------------------------------------------------------

fn bench_simple_draft(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple_ngram_draft");

    for &len in &[1_024usize, 8_192, 32_768] {
        let history = make_history(len);
        let sampled = history[len - 9];
        group.bench_with_input(BenchmarkId::new("history", len), &len, |b, _| {
            b.iter_batched(
                || {
                    SimpleNgramDrafter::new(SimpleNgramConfig {
                        size_ngram: 4,
                        size_mgram: 8,
                        check_rate: 1,
                    })
                },
                |mut drafter| black_box(drafter.draft(black_box(&history), sampled)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Keyed n-gram map
// ---------------------------------------------------------------------------

fn bench_keyed_draft(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_ngram_draft");

    for &len in &[1_024usize, 8_192, 32_768] {
        let history = make_history(len);
        let sampled = history[len - 9];
        group.bench_with_input(BenchmarkId::new("history", len), &len, |b, _| {
            b.iter_batched(
                || {
                    KeyedNgramMap::new(KeyedNgramConfig {
                        size_key: 4,
                        size_value: 8,
                        check_rate: 1,
                        min_hits: 1,
                        key_only: false,
                    })
                },
                |mut map| black_box(map.draft(black_box(&history), sampled)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Steady-state cost: the map has already scanned the history once, so the
/// statistics watermark makes subsequent calls cheap.
fn bench_keyed_draft_warm(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_ngram_draft_warm");

    let len = 8_192usize;
    let history = make_history(len + 64);
    let sampled = history[len - 9];
    group.bench_function("history_8192", |b| {
        b.iter_batched(
            || {
                let mut map = KeyedNgramMap::new(KeyedNgramConfig {
                    size_key: 4,
                    size_value: 8,
                    check_rate: 1,
                    min_hits: 1,
                    key_only: false,
                });
                // Warm the key table and watermark on a slightly shorter
                // prefix so the measured call is not throttled.
                map.draft(&history[..len - 32], sampled);
                map
            },
            |mut map| black_box(map.draft(black_box(&history[..len]), sampled)),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_simple_draft,
    bench_keyed_draft,
    bench_keyed_draft_warm
);
criterion_main!(benches);
