//! # Accessor Benchmarks
//!
//! Claims to validate:
//! - A cached read does no decoding and stays flat as values grow
//! - Resolving a materialized field is a map lookup
//! - Encryption cost is paid on write and on external refresh only

use crate::integration::Profile;
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use sd_01_value_coding::{CryptoValueCoderDecorator, JsonValueCoder, SharedCoder};
use sd_02_kv_stores::{InMemoryStore, KeyValueStore, KeyValueStoreExt};
use sd_03_coordinator::Coordinator;
use std::sync::Arc;

fn coordinator(coder: SharedCoder) -> Coordinator<Profile> {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::with_coder(coder));
    match Coordinator::new(store) {
        Ok(coordinator) => coordinator,
        Err(e) => panic!("Profile schema rejected: {e}"),
    }
}

fn encrypted() -> SharedCoder {
    let json: SharedCoder = Arc::new(JsonValueCoder);
    match CryptoValueCoderDecorator::with_key_prefix(json, &[9; 32], "enc_") {
        Ok(coder) => Arc::new(coder),
        Err(e) => panic!("bad key: {e}"),
    }
}

/// Cached `get` against decoding straight from the store.
pub fn bench_cached_read_vs_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("accessor-read");

    for tags in [1usize, 32, 512] {
        let profile = coordinator(Arc::new(JsonValueCoder));
        let value: Vec<String> = (0..tags).map(|i| format!("tag-{i}")).collect();
        profile.set(&Profile::TAGS, value);

        group.throughput(Throughput::Elements(tags as u64));
        group.bench_with_input(BenchmarkId::new("cached_get", tags), &tags, |b, _| {
            b.iter(|| black_box(profile.resolve(&Profile::TAGS).read(|tags| tags.len())))
        });
        group.bench_with_input(BenchmarkId::new("store_decode", tags), &tags, |b, _| {
            b.iter(|| black_box(profile.store().value::<Vec<String>>("tags")))
        });
    }

    group.finish();
}

/// Field resolution once the property exists.
pub fn bench_resolve(c: &mut Criterion) {
    let profile = coordinator(Arc::new(JsonValueCoder));
    let _ = profile.get(&Profile::FONT_SIZE);

    c.bench_function("accessor-resolve/materialized", |b| {
        b.iter(|| black_box(profile.resolve(&Profile::FONT_SIZE)))
    });
}

/// Writes with and without the encrypting coder.
pub fn bench_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("accessor-write");

    let plain = coordinator(Arc::new(JsonValueCoder));
    group.bench_function("plain", |b| {
        b.iter(|| plain.set(&Profile::PASSWORD, Some(black_box("correct horse".to_owned()))))
    });

    let sealed = coordinator(encrypted());
    group.bench_function("encrypted", |b| {
        b.iter(|| sealed.set(&Profile::PASSWORD, Some(black_box("correct horse".to_owned()))))
    });

    group.finish();
}
