//! # Adapters Layer
//!
//! - `memory.rs` - Plain map, for tests and ephemeral use
//! - `defaults/` - Platform defaults domain and the stores attached to it
//! - `cloud/` - Cloud-synced key-value replica

pub mod cloud;
pub mod defaults;
pub mod memory;
