//! # Domain Layer
//!
//! - `accessor.rs` - Typed field handles
//! - `schema.rs` - Field registry and capability table of a schema
//! - `change.rs` - Aggregate change events
//! - `config.rs` - Coordinator configuration
//! - `errors.rs` - Coordinator errors

pub mod accessor;
pub mod change;
pub mod config;
pub mod errors;
pub mod schema;
