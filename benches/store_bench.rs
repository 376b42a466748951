//! Benchmarks for simple-kv store operations
//!
//! Every mutation is followed by an fsync, so these measure durable writes.

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion};
use simple_kv::{DbmStore, KeyValueStore};
use tempfile::TempDir;

fn bench_update_single_key(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let mut store = DbmStore::open(temp_dir.path().join("update-bench")).unwrap();

    let mut count: u64 = 0;
    c.bench_function("simple-kv-update-bench", |b| {
        b.iter(|| {
            count += 1;
            store.put("myKey", Bytes::copy_from_slice(&count.to_le_bytes()));
        })
    });
}

fn bench_set_new_keys(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let mut store = DbmStore::open(temp_dir.path().join("set-bench")).unwrap();

    let value = Bytes::from_static(b"A");
    let mut count: u64 = 0;
    c.bench_function("simple-kv-set-bench", |b| {
        b.iter(|| {
            let key = count.to_string();
            count += 1;
            store.put(key.as_str(), value.clone());
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let mut store = DbmStore::open(temp_dir.path().join("get-bench")).unwrap();

    for i in 0..10_000u64 {
        store
            .try_put(&format!("key{i}"), &i.to_le_bytes())
            .unwrap();
    }

    let mut i: u64 = 0;
    c.bench_function("simple-kv-get-bench", |b| {
        b.iter(|| {
            let key = format!("key{}", i % 10_000);
            i += 1;
            assert!(store.get(key.as_str()).is_some());
        })
    });
}

criterion_group!(benches, bench_update_single_key, bench_set_new_keys, bench_get);
criterion_main!(benches);
