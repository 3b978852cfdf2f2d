//! Actions, reducers and the resolver that wires them to slice kinds.

mod reducer;
mod resolver;

pub use reducer::{Action, AsyncReducer, Reducer};
pub use resolver::{ReducerKey, ReducerRegistry, ReducerResolver};
