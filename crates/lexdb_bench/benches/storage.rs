//! Ordered store benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lexdb_bench::random_data;
use lexdb_codec::LexEncode;
use lexdb_storage::{FileStore, FileStoreOptions, InMemoryStore, OrderedStore, WriteBatch};
use tempfile::TempDir;

fn key(prefix: &str, n: i64) -> Vec<u8> {
    let mut key = prefix.as_bytes().to_vec();
    n.lex_encode_into(&mut key);
    key
}

fn populate(store: &dyn OrderedStore, count: i64) {
    let mut batch = WriteBatch::new();
    for n in 0..count {
        batch.put(key("k/", n), random_data(64));
    }
    store.write(batch).unwrap();
}

/// Benchmark single-put batches against the in-memory store.
fn bench_inmemory_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_write");

    for size in [64, 256, 1024, 4096] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let store = InMemoryStore::new();
            let data = random_data(size);
            let mut n = 0i64;

            b.iter(|| {
                let mut batch = WriteBatch::new();
                batch.put(key("k/", n), black_box(data.clone()));
                store.write(batch).unwrap();
                n += 1;
            });
        });
    }
    group.finish();
}

/// Benchmark point reads from a populated in-memory store.
fn bench_inmemory_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_get");

    for count in [100i64, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let store = InMemoryStore::new();
            populate(&store, count);
            let probe = key("k/", count / 2);

            b.iter(|| black_box(store.get(black_box(&probe)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark full prefix scans.
fn bench_inmemory_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_scan");

    for count in [100i64, 1000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let store = InMemoryStore::new();
            populate(&store, count);
            // a sibling prefix the scan must skip
            let mut batch = WriteBatch::new();
            batch.put(b"l/".to_vec(), Vec::new());
            store.write(batch).unwrap();

            b.iter(|| {
                let n = store.scan_prefix(black_box(b"k/")).unwrap().count();
                black_box(n);
            });
        });
    }
    group.finish();
}

/// Benchmark durable writes to the file store, with and without fsync.
fn bench_file_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_write");
    group.sample_size(20);

    for sync in [false, true] {
        group.bench_with_input(BenchmarkId::new("sync", sync), &sync, |b, &sync| {
            let dir = TempDir::new().unwrap();
            let options = FileStoreOptions::default().sync_on_write(sync);
            let store = FileStore::open(&dir.path().join("db"), options).unwrap();
            let data = random_data(256);
            let mut n = 0i64;

            b.iter(|| {
                let mut batch = WriteBatch::new();
                batch.put(key("k/", n), black_box(data.clone()));
                batch.put(key("$k/", n), Vec::new());
                store.write(batch).unwrap();
                n += 1;
            });
        });
    }
    group.finish();
}

/// Benchmark replaying the log on open.
fn bench_file_reopen(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_reopen");
    group.sample_size(10);

    for count in [1000i64, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("db");
            let options = FileStoreOptions::default().sync_on_write(false);
            {
                let store = FileStore::open(&path, options.clone()).unwrap();
                for n in 0..count {
                    let mut batch = WriteBatch::new();
                    batch.put(key("k/", n), random_data(64));
                    store.write(batch).unwrap();
                }
            }

            b.iter(|| {
                let store = FileStore::open(&path, options.clone()).unwrap();
                black_box(store.log_size());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_inmemory_write,
    bench_inmemory_get,
    bench_inmemory_scan,
    bench_file_write,
    bench_file_reopen,
);

criterion_main!(benches);
