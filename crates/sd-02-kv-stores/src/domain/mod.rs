//! # Domain Layer
//!
//! - `change.rs` - What a store announces
//! - `config.rs` - Store configuration
//! - `errors.rs` - Store errors

pub mod change;
pub mod config;
pub mod errors;
