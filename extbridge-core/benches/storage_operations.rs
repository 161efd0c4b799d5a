use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use extbridge_core::notify::ChangeSet;
use extbridge_core::replication::{MemoryCredentialStore, MetadataStore, ReplicationSynchronizer};
use extbridge_core::store::{FileSettings, LocalStore, MemorySettings, StorageSelector, StoreRecord};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn populated(entries: usize) -> StoreRecord {
    (0..entries)
        .map(|i| (format!("key_{}", i), json!({"index": i, "payload": "x".repeat(64)})))
        .collect()
}

fn profiles(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("profile-{}", i),
                "name": format!("Profile {}", i),
                "privKey": hex_secret(i),
            })
        })
        .collect()
}

fn hex_secret(seed: usize) -> String {
    format!("{:064x}", seed)
}

fn bench_local_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_store");
    group.measurement_time(Duration::from_secs(5));

    for size in [10usize, 100, 1000] {
        let store = LocalStore::new(Arc::new(MemorySettings::new()));
        store.set(&populated(size)).unwrap();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("set_one_key", size), &size, |b, _| {
            let item = populated(1);
            b.iter(|| store.set(black_box(&item)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("get_keys", size), &size, |b, _| {
            let selector = StorageSelector::from(&["key_0", "key_5", "missing"][..]);
            b.iter(|| black_box(store.get(&selector).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("get_all", size), &size, |b, _| {
            b.iter(|| black_box(store.get(&StorageSelector::All).unwrap()));
        });
    }

    group.finish();
}

fn bench_file_backend(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_settings");
    group.sample_size(20);

    let dir = TempDir::new().unwrap();
    let store = LocalStore::new(Arc::new(FileSettings::open(dir.path()).unwrap()));
    store.set(&populated(100)).unwrap();

    group.bench_function("set_one_key", |b| {
        let item = populated(1);
        b.iter(|| store.set(black_box(&item)).unwrap());
    });

    group.finish();
}

fn bench_change_sets(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_set");
    let items = populated(50);

    group.bench_function("encode_written", |b| {
        b.iter(|| serde_json::to_string(&ChangeSet::from_written(black_box(&items))).unwrap());
    });

    group.finish();
}

fn bench_replication(c: &mut Criterion) {
    let mut group = c.benchmark_group("replication");

    for count in [1usize, 10, 50] {
        let sync = ReplicationSynchronizer::new(
            MetadataStore::new(Arc::new(MemorySettings::new())),
            Arc::new(MemoryCredentialStore::new()),
        );
        let list = profiles(count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("sync_profiles", count), &count, |b, _| {
            b.iter(|| black_box(sync.sync_profiles(&list)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_local_store,
    bench_file_backend,
    bench_change_sets,
    bench_replication
);
criterion_main!(benches);
