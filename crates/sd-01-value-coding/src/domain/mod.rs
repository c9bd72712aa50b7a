//! # Domain Layer
//!
//! Errors shared by every coder, and the native forms of blob, timestamp
//! and float fields.

pub mod errors;
pub mod native;
