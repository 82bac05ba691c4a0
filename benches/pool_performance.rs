//! Pool performance benchmark: leaky pool reuse versus fresh allocation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pulse_lib::core::PoolingMode;
use pulse_lib::pool::{shared_pool, Pooled};
use std::sync::Arc;

const WINDOW_LEN: usize = 960;

fn bench_allocation_vs_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_vs_pool");

    for (label, mode) in [("fresh", PoolingMode::Disabled), ("leaky", PoolingMode::Leaky)] {
        let pool = shared_pool::<f64>(mode, 64, WINDOW_LEN);
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut buf = pool.acquire();
                buf.resize(WINDOW_LEN, 1.0);
                // Returns to the pool on drop
                let snapshot = Pooled::new(buf, Arc::clone(&pool));
                black_box(snapshot.iter().sum::<f64>());
            })
        });
    }

    group.finish();
}

fn bench_outstanding_snapshots(c: &mut Criterion) {
    let mut group = c.benchmark_group("outstanding_snapshots");

    for held in [16, 64, 256].iter() {
        let pool = shared_pool::<f64>(PoolingMode::Leaky, 64, WINDOW_LEN);
        group.bench_with_input(BenchmarkId::new("leaky", held), held, |b, &held| {
            b.iter(|| {
                // More outstanding buffers than pool slots forces discards
                let snapshots: Vec<_> = (0..held)
                    .map(|_| {
                        let mut buf = pool.acquire();
                        buf.resize(WINDOW_LEN, 0.0);
                        Pooled::new(buf, Arc::clone(&pool))
                    })
                    .collect();
                black_box(&snapshots);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_allocation_vs_pool, bench_outstanding_snapshots);
criterion_main!(benches);
