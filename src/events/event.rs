use crate::reducer::Action;
use crate::slice::Slice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type Shared = Arc<dyn Any + Send + Sync>;

/// Where a transition came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Dispatch,
    AsyncDispatch,
    /// Published from outside the dispatch pipeline, e.g. by an inspection
    /// tool replaying a recorded state.
    Foreign(String),
}

/// One completed reducer application.
///
/// Payloads are type-erased; read them back with [`action`](Self::action),
/// [`previous`](Self::previous) and [`next`](Self::next). Cloning an event
/// only bumps reference counts.
#[derive(Clone)]
pub struct TransitionEvent {
    action_kind: &'static str,
    slice_kind: &'static str,
    origin: Origin,
    action: Shared,
    previous: Shared,
    next: Shared,
    timestamp: DateTime<Utc>,
}

impl TransitionEvent {
    /// Capture one reducer application.
    pub fn new<S: Slice, A: Action>(origin: Origin, action: Arc<A>, previous: S, next: S) -> Self {
        Self {
            action_kind: A::kind_name(),
            slice_kind: S::kind_name(),
            origin,
            action,
            previous: Arc::new(previous),
            next: Arc::new(next),
            timestamp: Utc::now(),
        }
    }

    /// Name of the action kind.
    pub fn action_kind(&self) -> &'static str {
        self.action_kind
    }

    /// Name of the slice kind.
    pub fn slice_kind(&self) -> &'static str {
        self.slice_kind
    }

    /// Which pipeline produced the event.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// When the transition was computed.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The dispatched action, if it is of kind `A`.
    pub fn action<A: Action>(&self) -> Option<&A> {
        self.action.downcast_ref()
    }

    /// Slice before the reducer ran.
    pub fn previous<S: Slice>(&self) -> Option<&S> {
        self.previous.downcast_ref()
    }

    /// Slice produced by the reducer.
    pub fn next<S: Slice>(&self) -> Option<&S> {
        self.next.downcast_ref()
    }

    /// `"{action}_{slice}"`, the action type shown by inspection tools.
    pub fn label(&self) -> String {
        format!("{}_{}", self.action_kind, self.slice_kind)
    }

    /// Serializable summary for external tools.
    pub fn record(&self) -> TransitionRecord {
        TransitionRecord {
            label: self.label(),
            action_kind: self.action_kind.to_string(),
            slice_kind: self.slice_kind.to_string(),
            origin: self.origin.clone(),
            timestamp: self.timestamp,
        }
    }
}

impl fmt::Debug for TransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionEvent")
            .field("action_kind", &self.action_kind)
            .field("slice_kind", &self.slice_kind)
            .field("origin", &self.origin)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// Serializable summary of a [`TransitionEvent`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub label: String,
    pub action_kind: String,
    pub slice_kind: String,
    pub origin: Origin,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        value: i32,
    }

    crate::impl_slice!(Counter);

    #[derive(Debug, PartialEq)]
    struct Add(i32);
    impl Action for Add {}

    #[test]
    fn payloads_downcast_to_their_kinds() {
        let event = TransitionEvent::new(
            Origin::Dispatch,
            Arc::new(Add(2)),
            Counter { value: 1 },
            Counter { value: 3 },
        );

        assert_eq!(event.action::<Add>(), Some(&Add(2)));
        assert_eq!(event.previous::<Counter>().map(|c| c.value), Some(1));
        assert_eq!(event.next::<Counter>().map(|c| c.value), Some(3));
    }

    #[test]
    fn record_carries_label_and_kinds() {
        let event = TransitionEvent::new(
            Origin::Foreign("replay".into()),
            Arc::new(Add(1)),
            Counter { value: 0 },
            Counter { value: 1 },
        );

        let record = event.record();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(record.label, "Add_Counter");
        assert_eq!(json["slice_kind"], "Counter");
        assert_eq!(json["origin"]["foreign"], "replay");
    }
}
