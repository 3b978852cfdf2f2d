//! # Slicestore
//!
//! A typed, in-process state container with unidirectional data flow.
//!
//! Application state is split into independent, strongly typed slices. The
//! only way to change a slice is to dispatch an action through a registered
//! reducer; observers subscribe to change streams instead of polling.
//!
//! ## Building blocks
//!
//! - [`Store`] - Owns every slice and a change-notification hub
//! - [`Slice`] / [`Isolation`] - A state partition and how it is copied across
//!   the store boundary
//! - [`Reducer`] / [`AsyncReducer`] - Pure and suspending transitions
//! - [`ReducerRegistry`] - Maps (slice, action) pairs to reducers
//! - [`Dispatcher`] / [`AsyncDispatcher`] - The mutation pipelines
//! - [`EventPublisher`] / [`EventRelay`] - Transition events for external tools
//!
//! ## Data flow
//!
//! ```text
//! action ─→ Dispatcher ─→ resolver ─→ reducer(slice, action) ─→ new slice
//!                                                            │
//!                        EventPublisher ←─ transition event ─┤
//!                                                            ↓
//!            SliceStream / ChangeStream ←─ Store::update_slice
//! ```
//!
//! ## Example
//!
//! ```
//! use slicestore::{impl_slice, Action, Dispatcher, ReducerRegistry, Store};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Counter {
//!     value: i32,
//! }
//! impl_slice!(Counter);
//!
//! struct Increment;
//! impl Action for Increment {}
//!
//! let store = Store::builder().slice(Counter::default()).build().unwrap();
//! let reducers = ReducerRegistry::new()
//!     .with_fn(|c: Counter, _: &Increment| Counter { value: c.value + 1 });
//! let dispatcher = Dispatcher::new(store.clone(), Arc::new(reducers));
//!
//! dispatcher.dispatch::<Counter, _>(Increment).unwrap();
//!
//! assert_eq!(store.get_slice::<Counter>().unwrap(), Some(Counter { value: 1 }));
//! ```

pub mod dispatch;
pub mod error;
pub mod events;
pub mod reducer;
pub mod slice;
pub mod store;

// Re-export main types for convenience
pub use dispatch::{AsyncDispatcher, Dispatcher};
pub use error::{PublishError, ReduceError, Result, StoreError};
pub use events::{
    EventPublisher, EventRelay, EventSink, Origin, RelayConfig, Subscription, TransitionEvent,
    TransitionRecord,
};
pub use reducer::{Action, AsyncReducer, Reducer, ReducerRegistry, ReducerResolver};
pub use slice::{Isolation, Slice, SliceRegistry};
pub use store::{ChangeStream, SliceStream, Store, StoreBuilder};

/// Cancellation token accepted by [`AsyncDispatcher::dispatch_async_with`].
pub use tokio_util::sync::CancellationToken;
