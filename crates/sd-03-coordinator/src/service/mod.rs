//! # Coordinator Service
//!
//! - `coordinator.rs` - Registry, typed reads/writes, aggregate changes
//! - `capability.rs` - Capability field resolution
//! - `fields.rs` - Type-erased field operations, diagnostics, migration

mod capability;
mod coordinator;
mod fields;


pub use coordinator::Coordinator;
