//! Counter with sync and async dispatch

use async_trait::async_trait;
use futures::StreamExt;
use slicestore::{
    impl_slice, Action, AsyncDispatcher, AsyncReducer, CancellationToken, Dispatcher,
    EventPublisher, ReduceError, ReducerRegistry, Store,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq)]
struct Counter {
    value: i32,
    is_loading: bool,
}

impl_slice!(Counter);

struct Increment;
impl Action for Increment {}

struct FetchRemote;
impl Action for FetchRemote {}

struct RemoteCounter;

#[async_trait]
impl AsyncReducer<Counter, FetchRemote> for RemoteCounter {
    async fn reduce(
        &self,
        _slice: Counter,
        _action: &FetchRemote,
        cancel: CancellationToken,
    ) -> Result<Counter, ReduceError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ReduceError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(200)) => Ok(Counter {
                value: 100,
                is_loading: false,
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Counter Example ===\n");

    // Create a store with one slice
    let store = Store::builder().slice(Counter::default()).build()?;

    // Wire reducers: a pure increment, and a fetch that first marks loading
    let reducers = ReducerRegistry::new()
        .with_fn(|c: Counter, _: &Increment| Counter {
            value: c.value + 1,
            ..c
        })
        .with_fn(|c: Counter, _: &FetchRemote| Counter {
            is_loading: true,
            ..c
        })
        .with_async::<Counter, FetchRemote, _>(RemoteCounter);

    // Log every transition
    let publisher = EventPublisher::new();
    publisher
        .subscribe(|event| println!("transition: {}", event.label()))
        .detach();

    let dispatcher = AsyncDispatcher::new(
        Dispatcher::new(store.clone(), Arc::new(reducers)).with_publisher(publisher),
    );

    // Watch the slice on another task
    let watcher = tokio::spawn({
        let stream = store.observe_slice::<Counter>();
        async move {
            stream
                .for_each(|counter| async move { println!("observed: {counter:?}") })
                .await;
        }
    });

    println!("Incrementing twice...");
    dispatcher.dispatcher().dispatch::<Counter, _>(Increment)?;
    dispatcher.dispatcher().dispatch::<Counter, _>(Increment)?;

    println!("\nFetching remote value...");
    dispatcher.dispatch_async::<Counter, _>(FetchRemote).await?;

    println!("\nFetching again, cancelled after 50ms...");
    let cancel = CancellationToken::new();
    let (result, ()) = tokio::join!(
        dispatcher.dispatch_async_with::<Counter, _>(FetchRemote, cancel.clone()),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        },
    );
    println!("cancelled: {}", result.is_err_and(|err| err.is_cancelled()));

    store.dispose();
    watcher.await?;

    println!("\nFinal state: {:#?}", store.get_slice::<Counter>()?);
    Ok(())
}
