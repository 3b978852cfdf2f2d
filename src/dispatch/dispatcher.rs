use crate::error::{Result, StoreError};
use crate::events::{EventPublisher, Origin, TransitionEvent};
use crate::reducer::{Action, ReducerRegistry, ReducerResolver};
use crate::slice::Slice;
use crate::store::Store;
use std::sync::Arc;

/// Synchronous mutation pipeline.
///
/// Resolves the reducer for a (slice, action) pair, applies it to the current
/// slice, publishes the transition and commits the result to the store.
pub struct Dispatcher<R = ReducerRegistry> {
    store: Store,
    resolver: Arc<R>,
    publisher: Option<EventPublisher>,
}

impl<R: ReducerResolver> Dispatcher<R> {
    /// Create a dispatcher over `store` with reducers from `resolver`.
    pub fn new(store: Store, resolver: Arc<R>) -> Self {
        Self {
            store,
            resolver,
            publisher: None,
        }
    }

    /// Publish a [`TransitionEvent`] for every reducer application.
    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// The store reducers read from and commit to.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The reducer lookup in use.
    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    /// The event publisher, if one was attached.
    pub fn publisher(&self) -> Option<&EventPublisher> {
        self.publisher.as_ref()
    }

    /// Dispatch `action` against the slice of kind `S`.
    ///
    /// With no sync reducer wired for the pair this is a silent no-op. With
    /// one wired, the slice must exist or [`StoreError::MissingSlice`] is
    /// returned and nothing is committed.
    pub fn dispatch<S: Slice, A: Action>(&self, action: A) -> Result<()> {
        self.dispatch_shared::<S, A>(&Arc::new(action), Origin::Dispatch)
    }

    pub(crate) fn dispatch_shared<S: Slice, A: Action>(
        &self,
        action: &Arc<A>,
        origin: Origin,
    ) -> Result<()> {
        let Some(reducer) = self.resolver.resolve_sync::<S, A>() else {
            tracing::trace!(
                slice = S::kind_name(),
                action = A::kind_name(),
                "no sync reducer wired"
            );
            return Ok(());
        };

        let current = self.current::<S>()?;
        let previous = self.snapshot(&current)?;
        let next = reducer.reduce(current, action);

        self.commit(action, origin, previous, next)
    }

    /// Isolated copy of the slice of kind `S`, which must exist.
    pub(crate) fn current<S: Slice>(&self) -> Result<S> {
        self.store
            .get_slice::<S>()?
            .ok_or(StoreError::MissingSlice {
                kind: S::kind_name(),
            })
    }

    /// Copy of the pre-state for the transition event, only when one will be published.
    pub(crate) fn snapshot<S: Slice>(&self, current: &S) -> Result<Option<S>> {
        match self.publisher {
            Some(_) => self.store.isolate(current).map(Some),
            None => Ok(None),
        }
    }

    /// Publish the transition, then write `next` to the store.
    pub(crate) fn commit<S: Slice, A: Action>(
        &self,
        action: &Arc<A>,
        origin: Origin,
        previous: Option<S>,
        next: S,
    ) -> Result<()> {
        if let (Some(publisher), Some(previous)) = (&self.publisher, previous) {
            let event = TransitionEvent::new(
                origin,
                Arc::clone(action),
                previous,
                self.store.isolate(&next)?,
            );
            if let Err(err) = publisher.publish(&event) {
                tracing::warn!(label = %event.label(), error = %err, "transition publication failed");
            }
        }

        self.store.update_slice(next)?;
        tracing::debug!(
            slice = S::kind_name(),
            action = A::kind_name(),
            "slice committed"
        );
        Ok(())
    }
}

impl<R> Clone for Dispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            resolver: Arc::clone(&self.resolver),
            publisher: self.publisher.clone(),
        }
    }
}
