//! # Ports Layer
//!
//! - `coder.rs` - The `ValueCoder` port used by every store

pub mod coder;
