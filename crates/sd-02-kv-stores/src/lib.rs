//! # Key-Value Stores (sd-02)
//!
//! Raw string-keyed storage of [`NativeValue`]s with a change feed, plus a
//! typed extension that goes through the store's [`ValueCoder`].
//!
//! ## Implementations
//!
//! | Store | Backing | Change sources |
//! |-------|---------|----------------|
//! | `InMemoryStore` | `HashMap` | local calls |
//! | `DefaultsStore` | shared `DefaultsDomain` (memory or JSON file) | local calls, other stores on the domain, `reload()` |
//! | `UbiquitousStore` | device replica of a `CloudKeyValueBackend` | local calls, remote devices (Tokio task) |
//!
//! ## Notification Contract
//!
//! ```text
//! set_native_value(k, v)
//!   └─ gate ─┬─ value updated
//!            └─ StoreChange { key: k, origin } ──→ observers (registration order)
//! ```
//!
//! A change is published after the value is visible, so an observer reading
//! the store sees the new value. Every observer sees changes in mutation
//! order.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Change events, configuration, errors
//! - `ports/` - The `KeyValueStore` port and its typed extension
//! - `adapters/` - Store implementations

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::cloud::{CloudChange, CloudKeyValueBackend, CloudUpdate, DeviceId, UbiquitousStore};
pub use adapters::defaults::{DefaultsDomain, DefaultsStore, DomainChange, WriterId};
pub use adapters::memory::InMemoryStore;
pub use domain::change::{ChangeOrigin, StoreChange};
pub use domain::config::{CloudSyncConfig, DefaultsConfig};
pub use domain::errors::StoreError;
pub use ports::store::{KeyValueStore, KeyValueStoreExt, StoreObserver};

pub use sd_01_value_coding::{SharedCoder, ValueCoder};
pub use shared_bus::{ChangeFeed, ChangeStream, Subscription};
pub use shared_types::NativeValue;
