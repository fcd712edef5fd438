use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use heavy_hitters::frequency::TopKElements;

/// Benchmark: increment, with a mix of promotion and pure sketch updates.
fn bench_increment(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_increment");

    for k in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("single", k), &k, |b, &k| {
            let mut top_k: TopKElements<String> = TopKElements::new(k, 4096, 5).unwrap();
            let mut counter = 0u64;
            b.iter(|| {
                top_k.increment(&black_box(format!("item_{}", counter % 200)), 1);
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

/// Benchmark: decrement, mostly on already-tracked keys.
fn bench_decrement(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_decrement");

    for k in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("single", k), &k, |b, &k| {
            let mut top_k: TopKElements<String> = TopKElements::new(k, 4096, 5).unwrap();
            for i in 0..k {
                top_k.increment(&format!("item_{}", i), 1000);
            }

            let mut counter = 0usize;
            b.iter(|| {
                top_k.decrement(&black_box(format!("item_{}", counter % k)), 1);
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

/// Benchmark: estimate (point query), tracked and untracked mix.
fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_estimate");

    for k in [10, 100, 1000] {
        let mut top_k: TopKElements<String> = TopKElements::new(k, 4096, 5).unwrap();
        for i in 0..(k * 2) {
            top_k.increment(&format!("item_{}", i % k), 1);
        }

        group.bench_with_input(BenchmarkId::new("query", k), &k, |b, &k| {
            let mut counter = 0usize;
            b.iter(|| {
                let item = format!("item_{}", counter % k);
                black_box(top_k.estimate(&item));
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

/// Benchmark: sorted_top_keys snapshot cost at a full tracked set.
fn bench_sorted_top_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_sorted_top_keys");

    for k in [10, 100, 1000] {
        let mut top_k: TopKElements<String> = TopKElements::new(k, 4096, 5).unwrap();
        for rank in 1..=k {
            top_k.increment(&format!("item_{}", rank), (1000 / rank) as u64);
        }

        group.bench_with_input(BenchmarkId::new("snapshot", k), &k, |b, _| {
            b.iter(|| {
                black_box(top_k.sorted_top_keys());
            });
        });
    }

    group.finish();
}

/// Benchmark: a realistic Zipf-distributed query-frequency workload.
fn bench_zipf_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_zipf_workload");

    let mut top_k: TopKElements<String> = TopKElements::new(50, 8192, 5).unwrap();
    group.bench_function("mixed_updates_queries", |b| {
        b.iter(|| {
            for rank in 1..=200u64 {
                let key = format!("query_{}", rank);
                if rank % 10 == 0 {
                    black_box(top_k.estimate(&key));
                } else {
                    top_k.increment(&key, 1000 / rank);
                }
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_increment,
    bench_decrement,
    bench_estimate,
    bench_sorted_top_keys,
    bench_zipf_workload,
);
criterion_main!(benches);
