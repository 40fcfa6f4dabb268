// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Throughput benchmarks for the LRU core.

use cachemesh_lru::LruCache;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_put_churn(c: &mut Criterion) {
    c.bench_function("put_churn", |b| {
        let mut cache: LruCache<Vec<u8>> = LruCache::new(64 * 1024);
        let value = vec![0u8; 256];
        let mut i = 0u64;
        b.iter(|| {
            cache.put(format!("key-{}", i % 1024), value.clone());
            i += 1;
        });
    });
}

fn bench_get_hot(c: &mut Criterion) {
    c.bench_function("get_hot", |b| {
        let mut cache: LruCache<Vec<u8>> = LruCache::new(0);
        for i in 0..1024 {
            cache.put(format!("key-{i}"), vec![0u8; 64]);
        }
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key-{}", i % 1024);
            black_box(cache.get(&key));
            i += 1;
        });
    });
}

criterion_group!(benches, bench_put_churn, bench_get_hot);
criterion_main!(benches);
