use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::hint::black_box;

use wc_store::{AbortController, PersistenceOptions, Storage, Store, StoreComposer};

#[derive(Clone, Serialize, Deserialize)]
struct State {
    counter: usize,
    name: String,
}

fn initial() -> State {
    State {
        counter: 0,
        name: "test".to_string(),
    }
}

fn store_creation_benchmark(c: &mut Criterion) {
    c.bench_function("store_creation", |b| {
        b.iter(|| Store::new(black_box(initial())).unwrap());
    });
}

fn store_read_benchmark(c: &mut Criterion) {
    let store = Store::new(initial()).unwrap();

    c.bench_function("store_get_current", |b| {
        b.iter(|| {
            black_box(store.get_current());
        });
    });
}

fn store_update_benchmark(c: &mut Criterion) {
    let store = Store::new(initial()).unwrap();

    c.bench_function("store_update", |b| {
        let mut i = 0;
        b.iter(|| {
            store.update(|state| {
                state.counter = black_box(i);
            });
            i += 1;
        });
    });
}

fn store_merge_benchmark(c: &mut Criterion) {
    let store = Store::new(initial()).unwrap();

    c.bench_function("store_merge", |b| {
        let mut i = 0;
        b.iter(|| {
            store.merge(&json!({ "counter": black_box(i) })).unwrap();
            i += 1;
        });
    });
}

fn persisted_update_benchmark(c: &mut Criterion) {
    let store = Store::with_storage(
        initial(),
        Storage::in_memory(),
        PersistenceOptions::new("bench").durable("state"),
    )
    .unwrap();

    c.bench_function("persisted_update", |b| {
        let mut i = 0;
        b.iter(|| {
            store.update(|state| state.counter = black_box(i));
            i += 1;
        });
    });
}

fn store_subscribe_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_subscribe");
    let controller = AbortController::new();

    for subscriber_count in [1, 10, 100].iter() {
        let store = Store::new(initial()).unwrap();

        for _ in 0..*subscriber_count {
            store.on_change(&controller.signal(), |_, _| {
                // Empty subscriber
            });
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    store.update(|state| state.counter = black_box(i));
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

fn composer_lookup_benchmark(c: &mut Criterion) {
    let composer =
        StoreComposer::new((0..100).map(|i| (format!("store-{i}"), json!({ "i": i })))).unwrap();

    c.bench_function("composer_get_store", |b| {
        b.iter(|| {
            black_box(composer.get_store(black_box("store-99")).unwrap());
        });
    });
}

criterion_group!(
    benches,
    store_creation_benchmark,
    store_read_benchmark,
    store_update_benchmark,
    store_merge_benchmark,
    persisted_update_benchmark,
    store_subscribe_benchmark,
    composer_lookup_benchmark,
);
criterion_main!(benches);
