use super::event::TransitionEvent;
use super::publisher::{EventPublisher, Subscription};
use crate::error::BoxError;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// Destination for relayed transition events, e.g. an inspection tool bridge.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    async fn send(&self, event: TransitionEvent) -> Result<(), BoxError>;
}

/// Settings of an [`EventRelay`]. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Events queued ahead of the sink before new ones are dropped.
    pub capacity: usize,
    /// Name used in log output.
    pub name: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            name: "relay".to_string(),
        }
    }
}

/// Counts reported by [`EventRelay::shutdown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Events the sink accepted.
    pub delivered: usize,
    /// Events the sink rejected.
    pub failed: usize,
}

/// Background task draining transition events into an [`EventSink`].
///
/// The publisher side only does a non-blocking enqueue, so a slow or failing
/// sink never holds up dispatch. When the queue is full the event is dropped
/// and a warning logged.
pub struct EventRelay {
    subscription: Subscription,
    task: JoinHandle<RelayStats>,
}

impl EventRelay {
    /// Subscribe to `publisher` and start draining on the current tokio runtime.
    pub fn spawn<K: EventSink>(publisher: &EventPublisher, sink: K, config: RelayConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<TransitionEvent>(config.capacity.max(1));

        let name = config.name.clone();
        let subscription = publisher.subscribe(move |event| match tx.try_send(event.clone()) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(relay = %name, label = %dropped.label(), "relay queue full, dropping transition");
            }
        });

        let name = config.name;
        let task = tokio::spawn(async move {
            let mut stats = RelayStats::default();
            while let Some(event) = rx.recv().await {
                let label = event.label();
                match sink.send(event).await {
                    Ok(()) => stats.delivered += 1,
                    Err(err) => {
                        stats.failed += 1;
                        tracing::error!(relay = %name, %label, error = %err, "event sink failed");
                    }
                }
            }
            tracing::debug!(relay = %name, delivered = stats.delivered, failed = stats.failed, "relay stopped");
            stats
        });

        Self { subscription, task }
    }

    /// Unsubscribe, deliver whatever is still queued, and stop the task.
    pub async fn shutdown(self) -> RelayStats {
        let EventRelay { subscription, task } = self;
        subscription.unsubscribe();

        match task.await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::error!(error = %err, "relay task did not finish cleanly");
                RelayStats::default()
            }
        }
    }
}
