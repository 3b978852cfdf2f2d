use crate::error::ReduceError;
use crate::slice::{short_type_name, Slice};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Marker trait for actions: immutable descriptions of an intended change.
pub trait Action: Send + Sync + 'static {
    fn kind_name() -> &'static str
    where
        Self: Sized,
    {
        short_type_name::<Self>()
    }
}

/// Pure transition of a slice of kind `S` under an action of kind `A`.
///
/// Must be deterministic, perform no I/O and keep nothing from its inputs.
/// Any `Fn(S, &A) -> S` closure is a reducer.
pub trait Reducer<S: Slice, A: Action>: Send + Sync + 'static {
    fn reduce(&self, slice: S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    S: Slice,
    A: Action,
    F: Fn(S, &A) -> S + Send + Sync + 'static,
{
    fn reduce(&self, slice: S, action: &A) -> S {
        self(slice, action)
    }
}

/// Transition that may suspend, for I/O or delays, before yielding the new slice.
///
/// Implementations should watch `cancel` and return [`ReduceError::Cancelled`]
/// once it fires.
#[async_trait]
pub trait AsyncReducer<S: Slice, A: Action>: Send + Sync + 'static {
    async fn reduce(
        &self,
        slice: S,
        action: &A,
        cancel: CancellationToken,
    ) -> Result<S, ReduceError>;
}
