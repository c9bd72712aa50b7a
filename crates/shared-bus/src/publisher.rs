//! # Change Publisher
//!
//! Defines the publishing side of a change feed.

use crate::subscriber::{ChangeStream, Detach, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::{ReentrantMutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

type Observer<E> = Arc<dyn Fn(&E) + Send + Sync>;
type Filter<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

struct ObserverEntry<E> {
    id: u64,
    filter: Option<Filter<E>>,
    observer: Observer<E>,
}

pub(crate) struct FeedInner<E> {
    /// Registered observers, in registration order.
    observers: RwLock<Vec<ObserverEntry<E>>>,

    /// Serialises publication and replaying subscription.
    gate: ReentrantMutex<()>,

    /// Fan-out to async streams.
    sender: broadcast::Sender<E>,

    next_id: AtomicU64,

    /// Total events published.
    events_published: AtomicU64,

    capacity: usize,
}

impl<E> FeedInner<E> {
    fn is_registered(&self, id: u64) -> bool {
        self.observers.read().iter().any(|entry| entry.id == id)
    }
}

impl<E: Clone + Send + Sync + 'static> FeedInner<E> {
    fn dispatch(&self, event: &E) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Snapshot so observers may subscribe or unsubscribe while we call out.
        let snapshot: Vec<(u64, Option<Filter<E>>, Observer<E>)> = self
            .observers
            .read()
            .iter()
            .map(|entry| (entry.id, entry.filter.clone(), Arc::clone(&entry.observer)))
            .collect();

        let mut delivered = 0;
        for (id, filter, observer) in snapshot {
            if filter.as_ref().is_some_and(|accepts| !accepts(event)) {
                continue;
            }
            // An earlier observer may have dropped this one's subscription.
            if !self.is_registered(id) {
                continue;
            }
            observer(event);
            delivered += 1;
        }

        if self.sender.receiver_count() > 0 {
            // Only fails when every receiver is gone, which is fine.
            let _ = self.sender.send(event.clone());
        }

        trace!(delivered, "Change dispatched");
        delivered
    }
}

impl<E: Send + Sync> Detach for FeedInner<E> {
    fn detach(&self, id: u64) {
        self.observers.write().retain(|entry| entry.id != id);
    }

    fn contains(&self, id: u64) -> bool {
        self.is_registered(id)
    }
}

/// A synchronous, ordered change feed.
///
/// Cloning a feed yields another handle to the same observer list.
pub struct ChangeFeed<E> {
    inner: Arc<FeedInner<E>>,
}

impl<E> Clone for ChangeFeed<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Clone + Send + Sync + 'static> ChangeFeed<E> {
    /// Create a new feed with default stream capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new feed whose async streams buffer `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(FeedInner {
                observers: RwLock::new(Vec::new()),
                gate: ReentrantMutex::new(()),
                sender,
                next_id: AtomicU64::new(1),
                events_published: AtomicU64::new(0),
                capacity,
            }),
        }
    }

    /// Register an observer for every event.
    ///
    /// The observer stays registered until the returned [`Subscription`]
    /// is dropped.
    #[must_use = "dropping the subscription detaches the observer"]
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(observer))
    }

    /// Register an observer for events accepted by `filter`.
    #[must_use = "dropping the subscription detaches the observer"]
    pub fn subscribe_where<P, F>(&self, filter: P, observer: F) -> Subscription
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(Some(Arc::new(filter)), Arc::new(observer))
    }

    /// Deliver `current()` to the observer, then register it.
    ///
    /// Both steps happen under the publication gate, so no event can slip in
    /// between the replayed value and the first live one.
    #[must_use = "dropping the subscription detaches the observer"]
    pub fn subscribe_replaying<C, F>(&self, current: C, observer: F) -> Subscription
    where
        C: FnOnce() -> E,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let _gate = self.inner.gate.lock();
        let observer: Observer<E> = Arc::new(observer);
        observer(&current());
        self.register(None, observer)
    }

    /// Publish one event to every matching observer.
    ///
    /// Returns the number of synchronous observers that received it.
    pub fn publish(&self, event: E) -> usize {
        let _gate = self.inner.gate.lock();
        self.inner.dispatch(&event)
    }

    /// Run `mutate` and publish the event it reports, atomically with
    /// respect to other publishers and replaying subscribers.
    pub fn apply<F>(&self, mutate: F) -> usize
    where
        F: FnOnce() -> Option<E>,
    {
        let _gate = self.inner.gate.lock();
        match mutate() {
            Some(event) => self.inner.dispatch(&event),
            None => 0,
        }
    }

    /// Like [`apply`](Self::apply) for mutations that produce several events.
    pub fn apply_all<F>(&self, mutate: F) -> usize
    where
        F: FnOnce() -> Vec<E>,
    {
        let _gate = self.inner.gate.lock();
        mutate()
            .iter()
            .map(|event| self.inner.dispatch(event))
            .sum()
    }

    /// Run `f` while holding the publication gate.
    pub fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _gate = self.inner.gate.lock();
        f()
    }

    /// Open an async stream of future events.
    #[must_use]
    pub fn stream(&self) -> ChangeStream<E> {
        ChangeStream::new(self.inner.sender.subscribe())
    }

    /// Number of registered synchronous observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.observers.read().len()
    }

    /// Total number of events published so far.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.inner.events_published.load(Ordering::Relaxed)
    }

    /// Stream buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    fn register(&self, filter: Option<Filter<E>>, observer: Observer<E>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.write().push(ObserverEntry {
            id,
            filter,
            observer,
        });
        let inner: Arc<dyn Detach> = self.inner.clone();
        Subscription::new(id, Arc::downgrade(&inner))
    }
}

impl<E: Clone + Send + Sync + 'static> Default for ChangeFeed<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ChangeFeed<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("observers", &self.inner.observers.read().len())
            .field(
                "events_published",
                &self.inner.events_published.load(Ordering::Relaxed),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Clone) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let log = Arc::clone(&log);
            move |entry: &str| log.lock().push(entry.to_owned())
        };
        (log, sink)
    }

    #[test]
    fn test_observers_called_in_registration_order() {
        let feed = ChangeFeed::<u32>::new();
        let (log, sink) = recorder();

        let s1 = sink.clone();
        let _a = feed.subscribe(move |v| s1(&format!("a{v}")));
        let s2 = sink.clone();
        let _b = feed.subscribe(move |v| s2(&format!("b{v}")));

        assert_eq!(feed.publish(7), 2);
        assert_eq!(*log.lock(), vec!["a7", "b7"]);
    }

    #[test]
    fn test_drop_detaches_observer() {
        let feed = ChangeFeed::<u32>::new();
        let (log, sink) = recorder();

        let sub = feed.subscribe(move |v| sink(&v.to_string()));
        feed.publish(1);
        drop(sub);
        feed.publish(2);

        assert_eq!(*log.lock(), vec!["1"]);
        assert_eq!(feed.observer_count(), 0);
        assert_eq!(feed.events_published(), 2);
    }

    #[test]
    fn test_filtered_subscription() {
        let feed = ChangeFeed::<u32>::new();
        let (log, sink) = recorder();

        let _sub = feed.subscribe_where(|v| v % 2 == 0, move |v| sink(&v.to_string()));
        for v in 1..=4 {
            feed.publish(v);
        }

        assert_eq!(*log.lock(), vec!["2", "4"]);
    }

    #[test]
    fn test_replaying_subscription_sees_current_first() {
        let feed = ChangeFeed::<u32>::new();
        let (log, sink) = recorder();

        let _sub = feed.subscribe_replaying(|| 10, move |v| sink(&v.to_string()));
        feed.publish(11);

        assert_eq!(*log.lock(), vec!["10", "11"]);
    }

    #[test]
    fn test_apply_without_event_publishes_nothing() {
        let feed = ChangeFeed::<u32>::new();
        let (log, sink) = recorder();
        let _sub = feed.subscribe(move |v| sink(&v.to_string()));

        assert_eq!(feed.apply(|| None), 0);
        assert_eq!(feed.apply(|| Some(3)), 1);
        assert_eq!(feed.apply_all(|| vec![4, 5]), 2);
        assert_eq!(*log.lock(), vec!["3", "4", "5"]);
    }

    #[test]
    fn test_observer_may_reenter_feed() {
        let feed = ChangeFeed::<u32>::new();
        let (log, sink) = recorder();

        let inner_feed = feed.clone();
        let _sub = feed.subscribe(move |v| {
            sink(&v.to_string());
            if *v == 1 {
                // Publishing from inside an observer must not deadlock.
                inner_feed.publish(2);
            }
        });
        feed.publish(1);

        assert_eq!(*log.lock(), vec!["1", "2"]);
    }

    #[test]
    fn test_observer_dropped_mid_dispatch_is_skipped() {
        let feed = ChangeFeed::<u32>::new();
        let (log, sink) = recorder();

        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let killer = Arc::clone(&victim);
        let _first = feed.subscribe(move |_| {
            killer.lock().take();
        });
        *victim.lock() = Some(feed.subscribe(move |v| sink(&v.to_string())));

        feed.publish(1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_publish_from_many_threads() {
        let feed = ChangeFeed::<u32>::new();
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        let _sub = feed.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let feed = feed.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        feed.publish(i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 400);
    }
}
