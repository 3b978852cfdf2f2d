use super::reducer::{Action, AsyncReducer, Reducer};
use crate::slice::Slice;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type AnyBox = Box<dyn Any + Send + Sync>;

/// Lookup of the reducers wired for a (slice kind, action kind) pair.
///
/// Resolution must be deterministic and free of side effects.
pub trait ReducerResolver: Send + Sync + 'static {
    fn resolve_sync<S: Slice, A: Action>(&self) -> Option<Arc<dyn Reducer<S, A>>>;

    fn resolve_async<S: Slice, A: Action>(&self) -> Option<Arc<dyn AsyncReducer<S, A>>>;
}

/// Key of a reducer registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReducerKey {
    slice: TypeId,
    action: TypeId,
}

impl ReducerKey {
    /// Key of the pair `(S, A)`.
    pub fn of<S: Slice, A: Action>() -> Self {
        Self {
            slice: TypeId::of::<S>(),
            action: TypeId::of::<A>(),
        }
    }
}

/// In-memory [`ReducerResolver`] filled by registration code.
///
/// At most one reducer of each variety per pair; registering again replaces
/// the previous one. A sync and an async reducer may share a pair.
///
/// # Examples
///
/// ```
/// use slicestore::{impl_slice, Action, ReducerRegistry, ReducerResolver};
///
/// #[derive(Clone, Debug, Default)]
/// struct Counter {
///     value: i32,
/// }
/// impl_slice!(Counter);
///
/// struct Increment;
/// impl Action for Increment {}
///
/// let registry = ReducerRegistry::new()
///     .with_fn(|c: Counter, _: &Increment| Counter { value: c.value + 1 });
///
/// assert!(registry.resolve_sync::<Counter, Increment>().is_some());
/// assert!(registry.resolve_async::<Counter, Increment>().is_none());
/// ```
#[derive(Default)]
pub struct ReducerRegistry {
    // Arc<dyn Reducer<S, A>> per key
    sync: HashMap<ReducerKey, AnyBox>,
    // Arc<dyn AsyncReducer<S, A>> per key
    asynchronous: HashMap<ReducerKey, AnyBox>,
}

impl ReducerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire `reducer` as the sync reducer of `(S, A)`, replacing any previous one.
    pub fn register_sync<S, A, R>(&mut self, reducer: R) -> &mut Self
    where
        S: Slice,
        A: Action,
        R: Reducer<S, A>,
    {
        let reducer: Arc<dyn Reducer<S, A>> = Arc::new(reducer);
        if self
            .sync
            .insert(ReducerKey::of::<S, A>(), Box::new(reducer))
            .is_some()
        {
            tracing::debug!(
                slice = S::kind_name(),
                action = A::kind_name(),
                "replaced sync reducer"
            );
        }
        self
    }

    /// Register a closure as the sync reducer of its pair.
    pub fn register_fn<S, A, F>(&mut self, f: F) -> &mut Self
    where
        S: Slice,
        A: Action,
        F: Fn(S, &A) -> S + Send + Sync + 'static,
    {
        self.register_sync::<S, A, F>(f)
    }

    /// Wire `reducer` as the async reducer of `(S, A)`, replacing any previous one.
    pub fn register_async<S, A, R>(&mut self, reducer: R) -> &mut Self
    where
        S: Slice,
        A: Action,
        R: AsyncReducer<S, A>,
    {
        let reducer: Arc<dyn AsyncReducer<S, A>> = Arc::new(reducer);
        if self
            .asynchronous
            .insert(ReducerKey::of::<S, A>(), Box::new(reducer))
            .is_some()
        {
            tracing::debug!(
                slice = S::kind_name(),
                action = A::kind_name(),
                "replaced async reducer"
            );
        }
        self
    }

    /// Builder form of [`register_sync`](Self::register_sync).
    pub fn with_sync<S, A, R>(mut self, reducer: R) -> Self
    where
        S: Slice,
        A: Action,
        R: Reducer<S, A>,
    {
        self.register_sync::<S, A, R>(reducer);
        self
    }

    /// Builder form of [`register_fn`](Self::register_fn).
    pub fn with_fn<S, A, F>(mut self, f: F) -> Self
    where
        S: Slice,
        A: Action,
        F: Fn(S, &A) -> S + Send + Sync + 'static,
    {
        self.register_fn::<S, A, F>(f);
        self
    }

    /// Builder form of [`register_async`](Self::register_async).
    pub fn with_async<S, A, R>(mut self, reducer: R) -> Self
    where
        S: Slice,
        A: Action,
        R: AsyncReducer<S, A>,
    {
        self.register_async::<S, A, R>(reducer);
        self
    }

    /// Whether a sync reducer is wired for `(S, A)`.
    pub fn contains_sync<S: Slice, A: Action>(&self) -> bool {
        self.sync.contains_key(&ReducerKey::of::<S, A>())
    }

    /// Whether an async reducer is wired for `(S, A)`.
    pub fn contains_async<S: Slice, A: Action>(&self) -> bool {
        self.asynchronous.contains_key(&ReducerKey::of::<S, A>())
    }

    /// Number of registrations of both varieties.
    pub fn len(&self) -> usize {
        self.sync.len() + self.asynchronous.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReducerResolver for ReducerRegistry {
    fn resolve_sync<S: Slice, A: Action>(&self) -> Option<Arc<dyn Reducer<S, A>>> {
        self.sync
            .get(&ReducerKey::of::<S, A>())
            .and_then(|reducer| reducer.downcast_ref::<Arc<dyn Reducer<S, A>>>())
            .cloned()
    }

    fn resolve_async<S: Slice, A: Action>(&self) -> Option<Arc<dyn AsyncReducer<S, A>>> {
        self.asynchronous
            .get(&ReducerKey::of::<S, A>())
            .and_then(|reducer| reducer.downcast_ref::<Arc<dyn AsyncReducer<S, A>>>())
            .cloned()
    }
}
