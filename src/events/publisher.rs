use super::event::TransitionEvent;
use crate::error::PublishError;
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback = Arc<dyn Fn(&TransitionEvent) + Send + Sync>;

#[derive(Default)]
struct PublisherInner {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(u64, Callback)>>,
}

impl PublisherInner {
    fn remove(&self, id: u64) {
        self.subscribers.write().retain(|(sub_id, _)| *sub_id != id);
    }
}

/// Fan-out of transition events to any number of subscribers.
///
/// A panicking subscriber is isolated: the others still receive the event and
/// [`publish`](Self::publish) reports the failure instead of unwinding into
/// the dispatcher. Clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct EventPublisher {
    inner: Arc<PublisherInner>,
}

impl EventPublisher {
    /// Create a publisher with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for every subsequent event.
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped or [`unsubscribe`](Subscription::unsubscribe)d.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&TransitionEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers.write().push((id, Arc::new(callback)));

        Subscription {
            id,
            publisher: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every current subscriber.
    pub fn publish(&self, event: &TransitionEvent) -> Result<(), PublishError> {
        // Snapshot so callbacks can (un)subscribe without deadlocking.
        let subscribers: Vec<Callback> = self
            .inner
            .subscribers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        let total = subscribers.len();
        let mut failed = 0;
        for callback in subscribers {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                failed += 1;
                tracing::warn!(label = %event.label(), "transition subscriber panicked");
            }
        }

        if failed == 0 {
            Ok(())
        } else {
            Err(PublishError { failed, total })
        }
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

/// RAII handle for an event subscription.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    publisher: Weak<PublisherInner>,
}

impl Subscription {
    /// Remove the callback now. Same as dropping the handle.
    pub fn unsubscribe(self) {}

    /// Keep the callback registered for the publisher's whole lifetime.
    pub fn detach(mut self) {
        self.publisher = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(publisher) = self.publisher.upgrade() {
            publisher.remove(self.id);
        }
    }
}
