//! # Coordinator (sd-03)
//!
//! Typed accessors over a [`KeyValueStore`](sd_02_kv_stores::KeyValueStore):
//! declared fields map to storage keys exactly once, decoded values are
//! cached per field, and store changes flow back to typed observers.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!  get/set(F) ──→ │ Coordinator<S>                               │
//!                 │   registry: field id → StoredProperty<T>     │──→ on_change / change_stream
//!                 └───────────────┬──────────────────────────────┘      (FieldChange)
//!                                 │ lazily, once per field
//!                                 ▼
//!                 ┌──────────────────────────────┐
//!                 │ StoredProperty<T>            │──→ subscribe / stream (T)
//!                 │   key, default, cached T     │
//!                 └───────────────┬──────────────┘
//!                   write-through │ ▲ refresh on StoreChange{key}
//!                                 ▼ │
//!                 ┌──────────────────────────────┐
//!                 │ KeyValueStore + ValueCoder   │
//!                 └──────────────────────────────┘
//! ```
//!
//! ## Declaring a Schema
//!
//! ```ignore
//! stored_schema! {
//!     pub struct Preferences {
//!         IS_BOLD: bool = "isBold" => false,
//!         AGE: i64 = "age" => 30,
//!         GREETING: String = "greeting" => "Hello".to_owned(),
//!     }
//! }
//!
//! let prefs = Coordinator::<Preferences>::new(store)?;
//! prefs.set(&Preferences::AGE, 31);
//! assert_eq!(prefs.get(&Preferences::AGE), 31);
//! ```
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | One cached property per field | registry keyed by the declared field id |
//! | Reads never fail | default fallback, corrupt entries removed at load |
//! | Observers see the old cache | new value published before the cache is updated |
//! | Unique keys | checked when the coordinator is built |

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
mod macros;
pub mod property;
pub mod service;

pub use domain::accessor::{Accessor, StoredValue};
pub use domain::change::FieldChange;
pub use domain::config::{CoordinatorConfig, KeyMigration};
pub use domain::errors::CoordinatorError;
pub use domain::schema::{CapabilityBinding, CapabilityField, Field, FieldSnapshot, Schema};
pub use property::StoredProperty;
pub use service::Coordinator;

pub use sd_02_kv_stores::{ChangeOrigin, KeyValueStore, StoreError};
pub use shared_bus::{ChangeStream, Subscription};
