//! Push-event types and channel wiring for the web surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Event pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// Type of event (`activity`, `knowledge_graph_update`, `review_due`).
    pub event_type: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Event payload as JSON value.
    pub data: serde_json::Value,
}

impl PushEvent {
    /// Create a new push event stamped with the current time.
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: Utc::now(),
            data,
        }
    }

    /// An `activity` event.
    #[must_use]
    pub fn activity(kind: &str, detail: &str) -> Self {
        Self::new("activity", serde_json::json!({ "kind": kind, "detail": detail }))
    }

    /// A `knowledge_graph_update` event.
    #[must_use]
    pub fn graph_update(concept_count: usize) -> Self {
        Self::new(
            "knowledge_graph_update",
            serde_json::json!({ "concept_count": concept_count }),
        )
    }
}

/// Default capacity for the event broadcast channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Create the broadcast channel and cancellation token for a server instance.
#[must_use]
pub fn create_push_channel() -> (broadcast::Sender<PushEvent>, CancellationToken) {
    let (event_tx, _) = broadcast::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
    (event_tx, CancellationToken::new())
}
