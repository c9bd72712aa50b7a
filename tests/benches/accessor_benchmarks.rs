//! # Stored Defaults Benchmarks
//!
//! | Area | Claim |
//! |------|-------|
//! | Cached read | independent of value size |
//! | Resolve | map lookup once materialized |
//! | Encrypted write | one AEAD seal per write |

use criterion::{criterion_group, criterion_main};
use sd_tests::benchmarks::accessor::{bench_cached_read_vs_decode, bench_resolve, bench_writes};

criterion_group!(accessor, bench_cached_read_vs_decode, bench_resolve, bench_writes);
criterion_main!(accessor);
