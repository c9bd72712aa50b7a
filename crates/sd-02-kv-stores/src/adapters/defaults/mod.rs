//! # Platform Defaults
//!
//! A [`DefaultsDomain`] is the physical store: one map, optionally backed by
//! a JSON file. Any number of [`DefaultsStore`]s attach to a domain, each
//! with its own coder and feed, standing in for the several processes that
//! share one platform defaults database.

mod domain;
mod store;


pub use domain::{DefaultsDomain, DomainChange, WriterId};
pub use store::DefaultsStore;
