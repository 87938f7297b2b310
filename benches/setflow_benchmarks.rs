//! # Setflow Performance Benchmarks
//!
//! Benchmarks for the operations that run on every user trigger.
//!
//! ## Benchmark Categories
//!
//! - **Cascade**: multi-criteria sorting at playlist sizes
//! - **Curve**: sampling a drawn stroke and best-fit assignment
//! - **Session**: merging streamed records into a working set
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench cascade
//! cargo bench curve
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use setflow::assign;
use setflow::cascade::{self, CascadeContext, CriteriaStack};
use setflow::curve::{AlphaCanvas, CurveSampler};
use setflow::session::OrderingSession;
use setflow::track::{Attribute, Track};
use std::hint::black_box;

const SIZES: [usize; 4] = [10, 100, 500, 2000];

/// Deterministic tracks with spread-out attributes.
fn create_test_tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| {
            Track::new(format!("id{i}"), format!("Track {i}"))
                .with_bpm(90.0 + ((i * 37) % 90) as f64)
                .with_key(format!("{}{}", (i * 7) % 12 + 1, if i % 2 == 0 { 'A' } else { 'B' }))
                .with_energy(((i * 53) % 101) as f64)
        })
        .collect()
}

fn benchmark_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade");
    let context = CascadeContext::default();
    let stack = CriteriaStack::from_attributes([Attribute::Bpm, Attribute::Key, Attribute::Energy]);

    for size in SIZES {
        let tracks = create_test_tracks(size);
        group.bench_with_input(BenchmarkId::new("bpm_key_energy", size), &tracks, |b, tracks| {
            b.iter(|| cascade::cascade_sort(black_box(tracks), black_box(&stack), &context))
        });
    }

    let tracks = create_test_tracks(2000);
    group.bench_function("alphabetical_2000", |b| {
        b.iter(|| cascade::alphabetical(black_box(&tracks)))
    });

    group.finish();
}

fn benchmark_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("curve");

    let mut canvas = AlphaCanvas::new(800, 200);
    canvas.stroke_values(&[(0.0, 20.0), (40.0, 90.0), (70.0, 60.0), (100.0, 30.0)], 2.0);
    let sampler = CurveSampler::default();

    for size in SIZES {
        group.bench_with_input(BenchmarkId::new("sample", size), &size, |b, &size| {
            b.iter(|| sampler.sample(black_box(&canvas), size))
        });

        let tracks = create_test_tracks(size);
        let targets = sampler.sample(&canvas, size);
        group.bench_with_input(BenchmarkId::new("best_fit", size), &tracks, |b, tracks| {
            b.iter(|| assign::best_fit_order(black_box(tracks), Attribute::Energy, black_box(&targets)))
        });
    }

    group.finish();
}

fn benchmark_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    let tracks = create_test_tracks(500);

    group.bench_function("merge_500_streamed", |b| {
        b.iter_batched(
            OrderingSession::default,
            |mut session| {
                for track in &tracks {
                    session.merge(track.clone());
                }
                session
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, benchmark_cascade, benchmark_curve, benchmark_session);

criterion_main!(benches);
