//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`. Publishers never block and
//! never fail: with no subscribers an event is simply dropped.

use chrono::{DateTime, Utc};
use eagleeye_core::alarm::Alarm;
use eagleeye_core::geo::RelativePoint;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Published when an armed alarm zone is entered.
pub const ALARM_TRIGGERED: &str = "alarm.triggered";

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened inside the backend.
///
/// Built with [`DomainEvent::new`] plus the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"alarm.triggered"`.
    pub event_type: String,

    /// Kind of entity the event is about (e.g. `"alarm"`).
    pub source_entity_type: Option<String>,

    /// Identifier of that entity.
    pub source_entity_id: Option<String>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// `alarm.triggered` for `alarm`, fired by an object at `position`.
    pub fn alarm_triggered(alarm: &Alarm, position: RelativePoint, at: DateTime<Utc>) -> Self {
        Self::new(ALARM_TRIGGERED)
            .with_source("alarm", alarm.id.clone())
            .with_payload(serde_json::json!({
                "alarm_id": alarm.id,
                "top_left": alarm.top_left,
                "bottom_right": alarm.bottom_right,
                "position": position,
            }))
            .with_timestamp(at)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out event bus. Every subscriber sees every event published after it
/// subscribed; slow subscribers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // Err only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> Alarm {
        Alarm {
            id: "a-1".into(),
            top_left: RelativePoint::new(10.0, 10.0),
            bottom_right: RelativePoint::new(20.0, 20.0),
            active: true,
            triggered: true,
        }
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(DomainEvent::new("test.created").with_source("widget", "42"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.event_type, "test.created");
        assert_eq!(e2.source_entity_id.as_deref(), Some("42"));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DomainEvent::new("orphan.event"));
    }

    #[test]
    fn alarm_triggered_carries_zone_and_position() {
        let at = Utc::now();
        let event = DomainEvent::alarm_triggered(&zone(), RelativePoint::new(15.0, 12.5), at);

        assert_eq!(event.event_type, ALARM_TRIGGERED);
        assert_eq!(event.source_entity_type.as_deref(), Some("alarm"));
        assert_eq!(event.source_entity_id.as_deref(), Some("a-1"));
        assert_eq!(event.payload["alarm_id"], "a-1");
        assert_eq!(event.payload["position"]["x"], 15.0);
        assert_eq!(event.payload["top_left"]["y"], 10.0);
        assert_eq!(event.timestamp, at);
    }
}
