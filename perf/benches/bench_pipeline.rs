use basalt_events::{L2Update, SecurityId};
use basalt_ring::SpscRing;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use jasper_core::SecurityStore;
use jasper_perf::sample_l2;

fn bench_full_pipeline(c: &mut Criterion) {
    let (mut tx, mut rx) = SpscRing::<L2Update, 1024>::new();
    let store = SecurityStore::new();
    let aapl = SecurityId::new("AAPL");
    assert!(store.add(aapl));

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(1));

    group.bench_function("full_hot_path", |b| {
        let mut mid = 1_750_000u64;
        b.iter(|| {
            // 1. Build the record, as the generator would.
            mid = mid.wrapping_add(1) | 1_000_000;
            let msg = sample_l2(aapl, black_box(mid));

            // 2. Producer side: push into the ring.
            let _ = tx.try_push(msg);

            // 3. Consumer side: pop and apply to the store.
            if let Some(popped) = rx.try_pop() {
                black_box(store.apply_l2(&popped));
            }

            // 4. Reader side: take a snapshot.
            black_box(store.snapshot(aapl));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_full_pipeline);
criterion_main!(benches);
