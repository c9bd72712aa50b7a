//! # Shared Types Crate
//!
//! This crate contains the vocabulary every layer of the workspace agrees on:
//! the shapes a key-value store can hold natively.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Coders produce `NativeValue`s, stores persist
//!   them, nobody else invents a representation.
//! - **Small Surface**: Anything that is not a native shape is the coder's
//!   business (JSON, encryption), never the store's.

pub mod native;

pub use native::{NativeKind, NativeValue, Timestamp};
