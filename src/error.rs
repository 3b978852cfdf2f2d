//! Error taxonomy for registry, store and dispatch operations.

use thiserror::Error;

/// Boxed error produced by a failing async reducer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of store and dispatch operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the store and the dispatch pipelines.
///
/// All of these point at programmer error (wrong slice/action pairing,
/// an uninitialized store) except `Cancelled` and `Reducer`, which come
/// from the async path.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a slice of kind `{kind}` is already registered")]
    DuplicateSlice { kind: &'static str },

    #[error("slice of kind `{kind}` was never registered")]
    UnknownSlice { kind: &'static str },

    #[error("dispatch targets slice `{kind}` which is not present in the store")]
    MissingSlice { kind: &'static str },

    #[error("async dispatch was cancelled")]
    Cancelled,

    #[error("failed to copy slice `{kind}`: {source}")]
    Isolation {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("async reducer for `{action}` on `{slice}` failed: {source}")]
    Reducer {
        slice: &'static str,
        action: &'static str,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// True for `Cancelled`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled)
    }
}

/// Outcome of a failed async reduction.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("reduction cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(BoxError),
}

impl ReduceError {
    /// Wrap any error as a failed reduction.
    pub fn failed<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ReduceError::Failed(err.into())
    }
}

/// One or more event subscribers panicked while handling a transition.
///
/// Delivery to the remaining subscribers still happened.
#[derive(Debug, Error)]
#[error("{failed} of {total} event subscribers failed")]
pub struct PublishError {
    pub failed: usize,
    pub total: usize,
}
