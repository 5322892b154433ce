//! Throughput Benchmark for EmberCache
//!
//! This benchmark measures the query dispatcher end to end: each
//! iteration feeds a raw opcode+payload request through `dispatch`,
//! exactly as a decoded frame would arrive off the wire.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use embercache::commands::dispatch;
use embercache::protocol::types::opcode;
use embercache::storage::{Store, StoreConfig};

const NOW: u64 = 1_700_000_000;

fn request(op: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = op.to_le_bytes().to_vec();
    buf.extend_from_slice(payload);
    buf
}

fn big_store() -> Store {
    Store::new(StoreConfig {
        memory_ceiling: 1024 * 1024 * 1024,
        ..StoreConfig::default()
    })
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut store = big_store();
        let mut i = 0u64;
        b.iter(|| {
            let req = request(opcode::SET, format!("key:{} small_value", i).as_bytes());
            black_box(dispatch(&mut store, NOW, &req).unwrap());
            i += 1;
        });
    });

    group.bench_function("set_medium", |b| {
        let mut store = big_store();
        let value = "x".repeat(1024); // 1KB value
        let mut i = 0u64;
        b.iter(|| {
            let req = request(opcode::SET, format!("key:{} {}", i, value).as_bytes());
            black_box(dispatch(&mut store, NOW, &req).unwrap());
            i += 1;
        });
    });

    group.bench_function("set_overwrite", |b| {
        let mut store = big_store();
        b.iter(|| {
            let req = request(opcode::SET, b"hot_key some_value");
            black_box(dispatch(&mut store, NOW, &req).unwrap());
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let mut store = big_store();

    // Pre-populate with data
    for i in 0..100_000 {
        let req = request(opcode::SET, format!("key:{} value:{}", i, i).as_bytes());
        dispatch(&mut store, NOW, &req).unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let req = request(opcode::GET, format!("key:{}", i % 100_000).as_bytes());
            black_box(dispatch(&mut store, NOW, &req).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let req = request(opcode::GET, format!("missing:{}", i).as_bytes());
            black_box(dispatch(&mut store, NOW, &req).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark INC operations
fn bench_inc(c: &mut Criterion) {
    let mut group = c.benchmark_group("inc");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_counter", |b| {
        let mut store = big_store();
        let req = request(opcode::INC, b"counter");
        b.iter(|| {
            black_box(dispatch(&mut store, NOW, &req).unwrap());
        });
    });

    group.bench_function("multiple_counters", |b| {
        let mut store = big_store();
        let mut i = 0u64;
        b.iter(|| {
            let req = request(opcode::INC, format!("counter:{}", i % 1000).as_bytes());
            black_box(dispatch(&mut store, NOW, &req).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let mut store = big_store();

    // Pre-populate
    for i in 0..10_000 {
        let req = request(opcode::SET, format!("key:{} value:{}", i, i).as_bytes());
        dispatch(&mut store, NOW, &req).unwrap();
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let req = if i % 5 == 0 {
                // 20% writes
                request(opcode::SET, format!("new:{} value", i).as_bytes())
            } else {
                // 80% reads
                request(opcode::GET, format!("key:{}", i % 10_000).as_bytes())
            };
            black_box(dispatch(&mut store, NOW, &req).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark TTL assignment and expiry reaping
fn bench_ttl(c: &mut Criterion) {
    let mut group = c.benchmark_group("ttl");
    group.throughput(Throughput::Elements(1));

    group.bench_function("ttl_existing", |b| {
        let mut store = big_store();
        for i in 0..10_000 {
            let req = request(opcode::SET, format!("expire:{} value", i).as_bytes());
            dispatch(&mut store, NOW, &req).unwrap();
        }

        let mut i = 0u64;
        b.iter(|| {
            let req = request(opcode::TTL, format!("expire:{} 3600", i % 10_000).as_bytes());
            black_box(dispatch(&mut store, NOW, &req).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_expired", |b| {
        let mut store = big_store();
        b.iter(|| {
            // Re-create an already-dead item and pay the reap on access.
            let set = request(opcode::SET, b"dead value");
            dispatch(&mut store, NOW, &set).unwrap();
            let ttl = request(opcode::TTL, b"dead 1");
            dispatch(&mut store, NOW, &ttl).unwrap();
            let get = request(opcode::GET, b"dead");
            black_box(dispatch(&mut store, NOW + 10, &get).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_inc, bench_mixed, bench_ttl);

criterion_main!(benches);
