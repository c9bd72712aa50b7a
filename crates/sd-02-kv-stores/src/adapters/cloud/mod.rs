//! # Cloud-Synced Store
//!
//! ```text
//!  device A                      backend                       device B
//! ┌──────────────┐   push    ┌──────────────┐  broadcast   ┌──────────────┐
//! │ replica      │ ────────→ │ values       │ ───────────→ │ replica      │
//! │ pending      │           │ updates tx   │   (Tokio)    │ feed: External│
//! └──────────────┘           └──────────────┘              └──────────────┘
//! ```
//!
//! Local writes land in the replica at once and queue for the next
//! `synchronize()`. Remote updates arrive on a Tokio task, never on the
//! caller's thread.

mod backend;
mod store;


pub use backend::{CloudChange, CloudKeyValueBackend, CloudUpdate, DeviceId};
pub use store::UbiquitousStore;
