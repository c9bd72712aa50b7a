//! # Change Subscriber
//!
//! Defines the receiving side of a change feed: drop-to-cancel
//! subscriptions for synchronous observers and async streams.

use std::fmt;
use std::sync::Weak;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

/// Errors that can occur when receiving from a stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The feed has been dropped.
    #[error("change feed closed")]
    Closed,
}

/// Feed-side hook used by [`Subscription`] to remove its observer.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: u64);
    fn contains(&self, id: u64) -> bool;
}

/// Handle keeping one observer registered.
///
/// Dropping it detaches the observer. The handle does not keep the feed
/// alive.
#[must_use = "dropping the subscription detaches the observer"]
pub struct Subscription {
    id: u64,
    feed: Option<Weak<dyn Detach>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, feed: Weak<dyn Detach>) -> Self {
        Self {
            id,
            feed: Some(feed),
        }
    }

    /// A subscription attached to nothing.
    pub fn detached() -> Self {
        Self { id: 0, feed: None }
    }

    /// Whether the observer is still registered with a live feed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.feed
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|feed| feed.contains(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(feed) = self.feed.take().and_then(|weak| weak.upgrade()) else {
            return;
        };
        feed.detach(self.id);
        debug!(id = self.id, "Subscription dropped");
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Async view of a feed.
///
/// A slow consumer skips the events it missed and keeps going. Use
/// [`into_stream`](Self::into_stream) for `tokio_stream` combinators.
pub struct ChangeStream<E> {
    receiver: broadcast::Receiver<E>,
}

impl<E: Clone + Send + 'static> ChangeStream<E> {
    pub(crate) fn new(receiver: broadcast::Receiver<E>) -> Self {
        Self { receiver }
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the feed has been dropped.
    pub async fn recv(&mut self) -> Option<E> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "Change stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive without waiting.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::Closed` once the feed has been dropped.
    pub fn try_recv(&mut self) -> Result<Option<E>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(missed = n, "Change stream lagged");
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// Convert into a `Stream`, keeping every event not yet received.
    pub fn into_stream(self) -> impl Stream<Item = E> + Send + Unpin {
        BroadcastStream::new(self.receiver).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                warn!(missed = n, "Change stream lagged");
                None
            }
        })
    }
}
