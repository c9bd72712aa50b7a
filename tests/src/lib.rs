//! # Stored Defaults Test Suite
//!
//! Cross-crate tests that need more than one layer of the stack.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion bodies, driven from benches/
//! │   └── accessor.rs
//! │
//! └── integration/      # Coordinator over real store stacks
//!     ├── encrypted_defaults.rs
//!     ├── cloud_sync.rs
//!     ├── file_reload.rs
//!     └── concurrency.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sd-tests
//!
//! # By category
//! cargo test -p sd-tests integration::cloud_sync
//!
//! # Benchmarks
//! cargo bench -p sd-tests
//! ```

#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;
