use super::stream::{ChangeStream, SliceStream};
use crate::slice::{Slice, SliceRegistry};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, UnboundedSender};

/// A slice sender with its item type erased.
trait ErasedSender: Send + Sync {
    fn is_closed(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Slice> ErasedSender for UnboundedSender<T> {
    fn is_closed(&self) -> bool {
        UnboundedSender::is_closed(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Multicast change notification owned by a [`Store`](super::Store).
///
/// Every subscriber gets its own unbounded channel, so a slow reader never
/// holds up an update and never misses one. Senders whose stream was dropped
/// are pruned whenever a stream is opened and on every notification of their
/// kind.
#[derive(Default)]
pub(crate) struct ChangeHub {
    // UnboundedSender<T> per slice kind
    slices: HashMap<TypeId, Vec<Box<dyn ErasedSender>>>,
    any: Vec<UnboundedSender<()>>,
    closed: bool,
}

impl ChangeHub {
    /// Open a stream for kind `T`, seeded with `current`.
    ///
    /// Kinds that are not `registered` can never be updated, so their stream
    /// ends straight away and no sender is kept.
    pub(crate) fn watch_slice<T: Slice>(
        &mut self,
        registered: bool,
        current: Option<T>,
    ) -> SliceStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.closed || !registered {
            return SliceStream::new(rx);
        }

        self.prune();
        if let Some(current) = current {
            // Receiver is alive, cannot fail.
            let _ = tx.send(current);
        }
        self.slices
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Box::new(tx));
        SliceStream::new(rx)
    }

    pub(crate) fn watch_any(&mut self) -> ChangeStream {
        let (tx, rx) = mpsc::unbounded_channel();
        if !self.closed {
            self.prune();
            self.any.push(tx);
        }
        ChangeStream::new(rx)
    }

    /// Fan the freshly stored value of kind `T` out to its subscribers, then
    /// signal the any-change subscribers.
    pub(crate) fn notify<T: Slice>(&mut self, registry: &SliceRegistry, stored: &T) {
        if self.closed {
            return;
        }

        if let Some(senders) = self.slices.get_mut(&TypeId::of::<T>()) {
            senders.retain(|sender| {
                let Some(sender) = sender.as_any().downcast_ref::<UnboundedSender<T>>() else {
                    return false;
                };
                if sender.is_closed() {
                    return false;
                }
                match registry.isolate(stored) {
                    Ok(copy) => sender.send(copy).is_ok(),
                    Err(err) => {
                        // A stream that skipped a value would diverge from its peers.
                        tracing::error!(kind = T::kind_name(), error = %err, "closing slice stream, copy failed");
                        false
                    }
                }
            });
        }

        self.any.retain(|sender| sender.send(()).is_ok());
    }

    /// Drop senders whose stream is gone, across all kinds.
    fn prune(&mut self) {
        self.slices.retain(|_, senders| {
            senders.retain(|sender| !sender.is_closed());
            !senders.is_empty()
        });
        self.any.retain(|sender| !sender.is_closed());
    }

    /// Drop every sender so all open streams complete.
    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.slices.clear();
        self.any.clear();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.slices.values().map(Vec::len).sum::<usize>() + self.any.len()
    }
}
