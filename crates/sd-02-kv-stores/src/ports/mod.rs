//! # Ports Layer
//!
//! - `store.rs` - The `KeyValueStore` port every store implements

pub mod store;
