//! Job event broadcaster for streaming state changes to the presentation layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::job::JobSnapshot;

/// A state change of the controller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    /// Generation token of the job this event belongs to.
    pub generation: u64,
    /// Full view of the job after the change.
    pub snapshot: JobSnapshot,
    /// Timestamp of this event.
    pub timestamp: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(generation: u64, snapshot: JobSnapshot) -> Self {
        Self {
            generation,
            snapshot,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts job events to every subscriber.
#[derive(Clone)]
pub struct JobEventBroadcaster {
    sender: Arc<broadcast::Sender<JobEvent>>,
}

impl JobEventBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: JobEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber. It only sees events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for JobEventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
