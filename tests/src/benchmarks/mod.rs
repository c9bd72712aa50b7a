//! # Benchmarks
//!
//! Criterion bodies, grouped per layer and driven from `benches/`.

pub mod accessor;
