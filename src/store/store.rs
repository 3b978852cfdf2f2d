use super::hub::ChangeHub;
use super::stream::{ChangeStream, SliceStream};
use crate::error::{Result, StoreError};
use crate::slice::{Slice, SliceRegistry};
use parking_lot::RwLock;
use std::sync::Arc;

struct StoreState {
    registry: SliceRegistry,
    hub: ChangeHub,
}

/// A thread-safe store holding every slice of application state.
///
/// Cloning a `Store` yields another handle to the same state. Reads hand out
/// isolated copies; writes go through [`update_slice`](Self::update_slice),
/// which commits and notifies observers under one lock, so every observer sees
/// updates in commit order.
///
/// # Examples
///
/// ```
/// use slicestore::{impl_slice, Store};
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Counter {
///     value: i32,
/// }
///
/// impl_slice!(Counter);
///
/// let store = Store::builder().slice(Counter::default()).build().unwrap();
/// store.update_slice(Counter { value: 3 }).unwrap();
///
/// assert_eq!(store.get_slice::<Counter>().unwrap(), Some(Counter { value: 3 }));
/// ```
pub struct Store {
    state: Arc<RwLock<StoreState>>,
}

impl Store {
    /// Start building a store from its initial slices.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Create a store around an already populated registry.
    pub fn from_registry(registry: SliceRegistry) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                registry,
                hub: ChangeHub::default(),
            })),
        }
    }

    /// Get an isolated copy of the current slice of kind `T`.
    pub fn get_slice<T: Slice>(&self) -> Result<Option<T>> {
        self.state.read().registry.get::<T>()
    }

    /// Current slice of kind `T`, or `T::default()` if the kind is absent.
    pub fn get_slice_or_default<T: Slice + Default>(&self) -> Result<T> {
        Ok(self.get_slice::<T>()?.unwrap_or_default())
    }

    /// Current slice of kind `T`, or `fallback` if the kind is absent.
    pub fn get_slice_or<T: Slice>(&self, fallback: T) -> Result<T> {
        Ok(self.get_slice::<T>()?.unwrap_or(fallback))
    }

    /// Read a value out of the current slice of kind `T`.
    pub fn read_slice<T, R, F>(&self, f: F) -> Result<Option<R>>
    where
        T: Slice,
        F: FnOnce(&T) -> R,
    {
        Ok(self.get_slice::<T>()?.map(|slice| f(&slice)))
    }

    /// Replace the slice of kind `T` and notify observers.
    ///
    /// Returns a copy of the stored value. Fails with
    /// [`StoreError::UnknownSlice`] if `T` is not part of this store.
    pub fn update_slice<T: Slice>(&self, slice: T) -> Result<T> {
        let mut state = self.state.write();
        let StoreState { registry, hub } = &mut *state;

        let updated = registry.update(slice)?;
        if let Some(stored) = registry.stored::<T>() {
            hub.notify(registry, stored);
        }
        Ok(updated)
    }

    /// Copy a value with the isolation strategy registered for its kind.
    pub fn isolate<T: Slice>(&self, value: &T) -> Result<T> {
        self.state.read().registry.isolate(value)
    }

    /// Observe every committed value of kind `T`.
    ///
    /// When the kind exists, the stream starts with its current value.
    /// Subscription and the snapshot happen under the write lock, so no update
    /// can slip in between them. A kind that is not part of this store can
    /// never change, and its stream ends without yielding anything.
    pub fn observe_slice<T: Slice>(&self) -> SliceStream<T> {
        let mut state = self.state.write();
        let registered = state.registry.contains::<T>();
        let current = match state.registry.get::<T>() {
            Ok(current) => current,
            Err(err) => {
                tracing::error!(kind = T::kind_name(), error = %err, "cannot seed slice stream");
                None
            }
        };
        state.hub.watch_slice(registered, current)
    }

    /// Observe a `()` per committed update, across all kinds.
    pub fn observe_any_change(&self) -> ChangeStream {
        self.state.write().hub.watch_any()
    }

    /// Close the notification hub. Every open stream completes.
    ///
    /// Slices stay readable and writable; updates are no longer announced.
    pub fn dispose(&self) {
        let mut state = self.state.write();
        if state.hub.is_closed() {
            return;
        }
        let released = state.hub.subscriber_count();
        state.hub.close();
        tracing::debug!(released, "store disposed");
    }

    /// Whether [`dispose`](Self::dispose) has been called on any handle.
    pub fn is_disposed(&self) -> bool {
        self.state.read().hub.is_closed()
    }

    /// Whether a slice of kind `T` is part of this store.
    pub fn contains<T: Slice>(&self) -> bool {
        self.state.read().registry.contains::<T>()
    }

    /// Names of the slice kinds held by this store.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.state.read().registry.kinds()
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

/// Collects the initial slices of a [`Store`].
///
/// Order does not matter. The first duplicate kind is reported by
/// [`build`](Self::build).
#[derive(Default)]
pub struct StoreBuilder {
    registry: SliceRegistry,
    error: Option<StoreError>,
}

impl StoreBuilder {
    /// Add an initial slice. Its isolation strategy is resolved here.
    pub fn slice<T: Slice>(mut self, slice: T) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.registry.register(slice) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Finish the store, or report the first duplicate kind.
    pub fn build(self) -> Result<Store> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Store::from_registry(self.registry)),
        }
    }
}
