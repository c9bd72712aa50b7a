//! # Shared Bus - Change Feeds
//!
//! Every observable thing in the workspace (a store, a cached property, a
//! coordinator) announces its changes through a [`ChangeFeed`].
//!
//! ## Delivery Model
//!
//! ```text
//! ┌──────────────┐   apply(mutate)   ┌──────────────┐
//! │  Producer    │ ────────────────→ │  ChangeFeed  │
//! └──────────────┘                   │              │──→ observer #1 (sync)
//!                                    │   gate held  │──→ observer #2 (sync)
//!                                    │              │──→ ChangeStream (async)
//!                                    └──────────────┘
//! ```
//!
//! - Observers run synchronously on the publishing thread, in registration
//!   order, with no feed lock held.
//! - A reentrant gate serialises publication per feed, so a late subscriber
//!   never sees an event twice or misses one between "read current" and
//!   "register".
//! - Dropping a [`Subscription`] detaches its observer. There is no separate
//!   cancel call.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod publisher;
pub mod subscriber;

pub use publisher::ChangeFeed;
pub use subscriber::{ChangeStream, Subscription, SubscriptionError};

/// Events buffered per async stream before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 256);
    }
}
