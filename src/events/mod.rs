//! Transition events and their fan-out to external observers.
//!
//! Dispatch publishes one [`TransitionEvent`] per reducer application. The
//! [`EventPublisher`] delivers it synchronously to callbacks; an
//! [`EventRelay`] moves it onto a background task for slow sinks.

mod event;
mod publisher;
mod relay;

pub use event::{Origin, TransitionEvent, TransitionRecord};
pub use publisher::{EventPublisher, Subscription};
pub use relay::{EventRelay, EventSink, RelayConfig, RelayStats};
