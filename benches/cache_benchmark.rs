//! Performance benchmarks for memo-kit
//!
//! This benchmark suite measures:
//! - Digest derivation across argument counts
//! - Pool operations (remember hit/miss/forced, forget, sweep)
//! - Manager lookup
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memo_kit::hasher::DEFAULT_HASH_SECRET;
use memo_kit::{Args, DataProducer, KeyedHasher, ManagerConfig, Pool, PoolManager, Result};
use std::future::Future;
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Benchmark Test Fixtures
// ============================================================================

/// Producer returning a payload of configurable size
#[derive(Clone)]
struct BenchProducer {
    size: usize,
}

impl DataProducer<Arc<Vec<u8>>> for BenchProducer {
    fn produce(&self, _args: &Args) -> impl Future<Output = Result<Arc<Vec<u8>>>> + Send {
        let size = self.size;
        async move { Ok(Arc::new(vec![0u8; size])) }
    }
}

fn bench_pool() -> Pool<Arc<Vec<u8>>> {
    Pool::new(
        "bench",
        KeyedHasher::from_hex(DEFAULT_HASH_SECRET).expect("Failed to build hasher"),
    )
}

fn args_with(count: i64) -> Args {
    (0..count).fold(Args::new(), |args, i| args.with(i, format!("value_{}", i)))
}

// ============================================================================
// Group 1: Digest Benchmarks
// ============================================================================

fn hasher_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("hasher");
    let hasher = KeyedHasher::from_hex(DEFAULT_HASH_SECRET).expect("Failed to build hasher");

    for count in [0i64, 1, 4, 16].iter() {
        let args = args_with(*count);
        group.bench_with_input(BenchmarkId::new("digest", count), &args, |b, args| {
            b.iter(|| hasher.digest(black_box("bench_key"), black_box(args)));
        });
    }

    group.finish();
}

// ============================================================================
// Group 2: Pool Benchmarks
// ============================================================================

fn pool_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 10_000].iter() {
        // Remember - CACHE HIT
        // Measures: digest + shared lock + clone
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("remember_hit", size), size, |b, &size| {
                let pool = bench_pool();
                let producer = BenchProducer { size };
                let args = args_with(2);

                rt.block_on(async {
                    pool.remember("bench_hit", 5, &args, false, &producer)
                        .await
                        .expect("Failed to populate pool");
                });

                b.to_async(&rt).iter(|| async {
                    pool.remember(black_box("bench_hit"), 5, &args, false, &producer)
                        .await
                });
            });

        // Remember - CACHE MISS
        // Measures: digest + shared lock + exclusive lock + produce + store
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("remember_miss", size), size, |b, &size| {
                let pool = bench_pool();
                let producer = BenchProducer { size };
                let counter = Arc::new(AtomicU64::new(0));

                b.to_async(&rt).iter(|| {
                    let pool = pool.clone();
                    let producer = producer.clone();
                    let counter = counter.clone();
                    async move {
                        // Unique args for each iteration to force a miss
                        let current = counter.fetch_add(1, Ordering::Relaxed);
                        let args = Args::new().with(1, current);
                        pool.remember(black_box("bench_miss"), 5, &args, false, &producer)
                            .await
                    }
                });
            });
    }

    // Forced refresh
    // Measures: digest + exclusive lock + produce + store (skip cache read)
    group.bench_function("remember_forced", |b| {
        let pool = bench_pool();
        let producer = BenchProducer { size: 1000 };
        let args = args_with(2);

        b.to_async(&rt).iter(|| async {
            pool.remember(black_box("bench_forced"), 5, &args, true, &producer)
                .await
        });
    });

    // Forget
    group.bench_function("forget", |b| {
        let pool = bench_pool();
        let producer = BenchProducer { size: 1000 };
        let args = args_with(2);

        b.to_async(&rt).iter(|| async {
            // Setup: insert before each iteration
            pool.remember("bench_forget", 5, &args, false, &producer)
                .await
                .expect("Failed to populate pool");
            // Measure: forget operation
            pool.forget(black_box("bench_forget"), &args).await
        });
    });

    // Sweep over a pool with no expired entries
    group.bench_function("sweep_1000_live", |b| {
        let pool = bench_pool();
        let producer = BenchProducer { size: 10 };

        rt.block_on(async {
            for i in 0..1000 {
                pool.remember("bench_sweep", 60, &Args::new().with(1, i), false, &producer)
                    .await
                    .expect("Failed to populate pool");
            }
        });

        b.to_async(&rt).iter(|| async { pool.sweep().await });
    });

    group.finish();
}

// ============================================================================
// Group 3: Manager Benchmarks
// ============================================================================

fn manager_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    group.bench_function("get_pool", |b| {
        let manager: PoolManager<Arc<Vec<u8>>> =
            PoolManager::new(ManagerConfig::new().with_auto_sweep(false))
                .expect("Failed to build manager");
        rt.block_on(async {
            for i in 0..16 {
                manager.add_pool(&format!("pool_{}", i)).await;
            }
        });

        b.to_async(&rt)
            .iter(|| async { manager.get_pool(black_box("pool_7")).await });
    });

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(benches, hasher_benchmarks, pool_benchmarks, manager_benchmarks);
criterion_main!(benches);
