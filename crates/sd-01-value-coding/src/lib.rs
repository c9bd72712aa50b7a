//! # Value Coding (sd-01)
//!
//! Translates typed values into the shapes a key-value store can hold
//! natively, and back.
//!
//! ## Architecture
//!
//! ```text
//!   T: Serialize ──to_value──→ serde_json::Value ──ValueCoder::encode──→ NativeValue
//!   T: Deserialize ←from_value── serde_json::Value ←─ValueCoder::decode─── NativeValue
//! ```
//!
//! The object-safe [`ValueCoder`] works on `serde_json::Value` so stores can
//! hold an `Arc<dyn ValueCoder>`; [`ValueCoderExt`] adds the typed surface.
//! Blob, timestamp and float fields skip JSON and reach the coder through
//! `encode_native`/`decode_native`, so they are stored as `Data`, `Date` and
//! `Float`.
//! Every operation receives the storage key so a decorator can decide per key
//! what to do.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Coding errors and native field forms
//! - `ports/` - The `ValueCoder` port and its typed extension
//! - `adapters/` - `JsonValueCoder` and the encryption decorator
//!
//! ## Usage
//!
//! ```ignore
//! use sd_01_value_coding::{CryptoValueCoderDecorator, JsonValueCoder, ValueCoderExt};
//!
//! let coder = CryptoValueCoderDecorator::with_key_prefix(
//!     Arc::new(JsonValueCoder),
//!     &key_bytes,
//!     "enc_",
//! )?;
//! let native = coder.encode_value(&"secret", "enc_token")?;
//! let back: String = coder.decode_value(native, "enc_token")?;
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::crypto::{CryptoValueCoderDecorator, KeyPredicate};
pub use adapters::json::JsonValueCoder;
pub use domain::errors::CoderError;
pub use domain::native::serializes_to_null;
pub use ports::coder::{SharedCoder, ValueCoder, ValueCoderExt};

pub use shared_types::{NativeKind, NativeValue};
