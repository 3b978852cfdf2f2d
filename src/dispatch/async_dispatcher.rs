use super::dispatcher::Dispatcher;
use crate::error::{ReduceError, Result, StoreError};
use crate::events::Origin;
use crate::reducer::{Action, ReducerRegistry, ReducerResolver};
use crate::slice::Slice;
use crate::store::Store;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Asynchronous mutation pipeline.
///
/// Every call first runs the sync reducer for the same pair (if any), which
/// lets it mark the slice as in progress. The async reducer then sees that
/// state, and its result is committed once it resolves.
///
/// Concurrent dispatches against one slice kind each reduce from their own
/// snapshot, and the last to complete is the one left in the store.
/// Completion order, not call order, decides. Callers that need sequencing
/// must await one dispatch before starting the next.
pub struct AsyncDispatcher<R = ReducerRegistry> {
    dispatcher: Dispatcher<R>,
}

impl<R: ReducerResolver> AsyncDispatcher<R> {
    /// Wrap a sync dispatcher; its store, resolver and publisher are shared.
    pub fn new(dispatcher: Dispatcher<R>) -> Self {
        Self { dispatcher }
    }

    /// The store results are committed to.
    pub fn store(&self) -> &Store {
        self.dispatcher.store()
    }

    /// The sync pipeline run before every async reduction.
    pub fn dispatcher(&self) -> &Dispatcher<R> {
        &self.dispatcher
    }

    /// Dispatch `action` without a cancellation source.
    pub async fn dispatch_async<S: Slice, A: Action>(&self, action: A) -> Result<()> {
        self.dispatch_async_with::<S, A>(action, CancellationToken::new())
            .await
    }

    /// Dispatch `action`, aborting with [`StoreError::Cancelled`] once `cancel` fires.
    ///
    /// A cancelled dispatch never commits the async result. A token that is
    /// already cancelled fails before the sync reducer runs.
    pub async fn dispatch_async_with<S: Slice, A: Action>(
        &self,
        action: A,
        cancel: CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let action = Arc::new(action);
        self.dispatcher
            .dispatch_shared::<S, A>(&action, Origin::AsyncDispatch)?;

        let Some(reducer) = self.dispatcher.resolver().resolve_async::<S, A>() else {
            return Ok(());
        };

        let current = self.dispatcher.current::<S>()?;
        let previous = self.dispatcher.snapshot(&current)?;

        tracing::debug!(
            slice = S::kind_name(),
            action = A::kind_name(),
            "awaiting async reducer"
        );
        let reduced = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ReduceError::Cancelled),
            result = reducer.reduce(current, &action, cancel.clone()) => result,
        };

        let next = match reduced {
            Ok(_) if cancel.is_cancelled() => return Err(StoreError::Cancelled),
            Ok(next) => next,
            Err(ReduceError::Cancelled) => {
                tracing::debug!(
                    slice = S::kind_name(),
                    action = A::kind_name(),
                    "async dispatch cancelled"
                );
                return Err(StoreError::Cancelled);
            }
            Err(ReduceError::Failed(source)) => {
                return Err(StoreError::Reducer {
                    slice: S::kind_name(),
                    action: A::kind_name(),
                    source,
                })
            }
        };

        self.dispatcher
            .commit(&action, Origin::AsyncDispatch, previous, next)
    }
}

impl<R> Clone for AsyncDispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPublisher;
    use crate::reducer::AsyncReducer;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter {
        value: i32,
        is_loading: bool,
    }

    crate::impl_slice!(Counter);

    struct FetchCounter;
    impl Action for FetchCounter {}

    struct Explode;
    impl Action for Explode {}

    struct FetchReducer {
        seen_loading: Arc<Mutex<Option<bool>>>,
    }

    #[async_trait]
    impl AsyncReducer<Counter, FetchCounter> for FetchReducer {
        async fn reduce(
            &self,
            slice: Counter,
            _action: &FetchCounter,
            _cancel: CancellationToken,
        ) -> std::result::Result<Counter, ReduceError> {
            *self.seen_loading.lock() = Some(slice.is_loading);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(Counter {
                value: 42,
                is_loading: false,
            })
        }
    }

    #[derive(Clone, Debug, Default)]
    struct Gone;

    crate::impl_slice!(Gone);

    struct Revive;
    impl Action for Revive {}

    struct ReviveReducer;

    #[async_trait]
    impl AsyncReducer<Gone, Revive> for ReviveReducer {
        async fn reduce(
            &self,
            slice: Gone,
            _action: &Revive,
            _cancel: CancellationToken,
        ) -> std::result::Result<Gone, ReduceError> {
            Ok(slice)
        }
    }

    struct ExplodingReducer;

    #[async_trait]
    impl AsyncReducer<Counter, Explode> for ExplodingReducer {
        async fn reduce(
            &self,
            _slice: Counter,
            _action: &Explode,
            _cancel: CancellationToken,
        ) -> std::result::Result<Counter, ReduceError> {
            Err(ReduceError::failed("backend unavailable"))
        }
    }

    fn dispatcher(seen_loading: Arc<Mutex<Option<bool>>>) -> AsyncDispatcher {
        let registry = ReducerRegistry::new()
            .with_fn(|slice: Counter, _: &FetchCounter| Counter {
                is_loading: true,
                ..slice
            })
            .with_async::<Counter, FetchCounter, _>(FetchReducer { seen_loading })
            .with_async::<Counter, Explode, _>(ExplodingReducer)
            .with_async::<Gone, Revive, _>(ReviveReducer);
        let store = Store::builder().slice(Counter::default()).build().unwrap();
        AsyncDispatcher::new(Dispatcher::new(store, Arc::new(registry)))
    }

    #[tokio::test(start_paused = true)]
    async fn sync_reducer_runs_first() {
        let seen_loading = Arc::new(Mutex::new(None));
        let dispatcher = dispatcher(Arc::clone(&seen_loading));
        let mut stream = dispatcher.store().observe_slice::<Counter>();

        dispatcher
            .dispatch_async::<Counter, _>(FetchCounter)
            .await
            .unwrap();

        assert_eq!(*seen_loading.lock(), Some(true));
        assert_eq!(stream.try_recv().map(|c| c.is_loading), Some(false));
        assert_eq!(stream.try_recv().map(|c| c.is_loading), Some(true));
        assert_eq!(
            stream.try_recv(),
            Some(Counter {
                value: 42,
                is_loading: false
            })
        );
    }

    #[tokio::test]
    async fn failing_reducer_surfaces_and_commits_nothing() {
        let dispatcher = dispatcher(Arc::default());

        let err = dispatcher
            .dispatch_async::<Counter, _>(Explode)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Reducer { action: "Explode", .. }));
        assert_eq!(
            dispatcher.store().get_slice::<Counter>().unwrap(),
            Some(Counter::default())
        );
    }

    #[tokio::test]
    async fn async_reducer_on_missing_slice_fails() {
        let dispatcher = dispatcher(Arc::default());
        let mut changes = dispatcher.store().observe_any_change();

        let err = dispatcher
            .dispatch_async::<Gone, _>(Revive)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::MissingSlice { kind: "Gone" }));
        assert_eq!(changes.drain(), 0);
    }

    #[tokio::test]
    async fn pre_cancelled_token_fails_fast() {
        let dispatcher = dispatcher(Arc::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = dispatcher
            .dispatch_async_with::<Counter, _>(FetchCounter, cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!dispatcher.store().get_slice::<Counter>().unwrap().unwrap().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn async_transitions_are_published() {
        let publisher = EventPublisher::new();
        let published = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let published = Arc::clone(&published);
            publisher.subscribe(move |event| published.lock().push(event.next::<Counter>().cloned()))
        };
        let base = dispatcher(Arc::default());
        let dispatcher = AsyncDispatcher::new(base.dispatcher().clone().with_publisher(publisher));

        dispatcher
            .dispatch_async::<Counter, _>(FetchCounter)
            .await
            .unwrap();

        let published = published.lock();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].as_ref().map(|c| c.is_loading), Some(true));
        assert_eq!(published[1].as_ref().map(|c| c.value), Some(42));
    }
}
