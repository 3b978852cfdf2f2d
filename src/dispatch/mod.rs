//! Synchronous and asynchronous dispatch pipelines.

mod async_dispatcher;
mod dispatcher;

pub use async_dispatcher::AsyncDispatcher;
pub use dispatcher::Dispatcher;
