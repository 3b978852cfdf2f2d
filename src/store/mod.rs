//! High-level state management with stores.
//!
//! A store owns the slice registry plus the change-notification hub, and is
//! the only handle the rest of an application needs for state access.

mod hub;
mod store;
mod stream;

pub use store::{Store, StoreBuilder};
pub use stream::{ChangeStream, SliceStream};
