//! In-process live event bus.
//!
//! Services publish [`LiveEvent`]s addressed to a user; every open WebSocket
//! subscribes and forwards the events that belong to its user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Event names sent to clients
pub mod names {
    pub const VITAL_SIGNS_UPDATE: &str = "vital_signs_update";
    pub const NOTIFICATION: &str = "notification";
    pub const MEDICATION_REMINDER: &str = "medication_reminder";
    pub const REPORT_READY: &str = "report_ready";
}

const DEFAULT_CAPACITY: usize = 1024;

/// A message for one user's live connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEvent {
    pub user_id: String,
    pub event: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl LiveEvent {
    pub fn new(user_id: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            event: event.into(),
            payload: Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Wire format sent over the socket: `{event, payload, timestamp}`
    pub fn to_message(&self) -> Value {
        serde_json::json!({
            "event": self.event,
            "payload": self.payload,
            "timestamp": self.timestamp,
        })
    }
}

/// Fan-out bus over a broadcast channel; slow receivers observe `Lagged`
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LiveEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to current subscribers; dropped silently when nobody listens
    pub fn publish(&self, event: LiveEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(LiveEvent::new("user-1", names::REPORT_READY).with_payload(json!({"id": 1})));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.user_id, "user-1");
        assert_eq!(event.event, "report_ready");
        assert_eq!(event.payload["id"], 1);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(LiveEvent::new("user-1", names::NOTIFICATION));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_message_shape() {
        let message = LiveEvent::new("user-1", names::NOTIFICATION)
            .with_payload(json!({"title": "Hi"}))
            .to_message();
        assert_eq!(message["event"], "notification");
        assert_eq!(message["payload"]["title"], "Hi");
        assert!(message.get("timestamp").is_some());
        assert!(message.get("user_id").is_none());
    }
}
