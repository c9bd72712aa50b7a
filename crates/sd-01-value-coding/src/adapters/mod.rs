//! # Adapters Layer
//!
//! Concrete coders.
//!
//! - `json.rs` - Native shapes where possible, JSON bytes otherwise
//! - `crypto.rs` - AEAD decorator around any other coder

pub mod crypto;
pub mod json;
