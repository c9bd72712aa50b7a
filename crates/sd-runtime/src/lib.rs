//! # Stored Defaults Runtime Library
//!
//! Exposes the runtime's modules for testing. The entry point is the
//! `sd-runtime` binary.
//!
//! - `config` - environment configuration
//! - `container` - builds the store stack once
//! - `schema` - the sample `Preferences` schema and its capabilities
//! - `commands` - the command-line surface

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod commands;
pub mod config;
pub mod container;
pub mod schema;

pub use commands::{watch, Command, CommandError, USAGE};
pub use config::{ConfigError, RuntimeConfig};
pub use container::Container;
pub use schema::Preferences;
