//! Alarm notification service.
//!
//! [`AlarmNotificationService`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and turns every `alarm.triggered` event into an outbound email. Delivery
//! failures are logged and never reach the publisher.

use tokio::sync::broadcast;

use crate::bus::{DomainEvent, ALARM_TRIGGERED};
use crate::delivery::email::EmailDelivery;

/// Background consumer for alarm events.
pub struct AlarmNotificationService {
    email: Option<EmailDelivery>,
}

impl AlarmNotificationService {
    /// `email = None` keeps the service running but only logs alarms.
    pub fn new(email: Option<EmailDelivery>) -> Self {
        Self { email }
    }

    /// Run until the bus is closed. Returns how many alarm events were handled.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) -> usize {
        let mut handled = 0usize;
        loop {
            match receiver.recv().await {
                Ok(event) if event.event_type == ALARM_TRIGGERED => {
                    self.notify(&event).await;
                    handled += 1;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Alarm notifier lagged, some alarms were not notified");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, alarm notifier shutting down");
                    break;
                }
            }
        }
        handled
    }

    async fn notify(&self, event: &DomainEvent) {
        let alarm_id = event.source_entity_id.as_deref().unwrap_or("unknown");
        tracing::warn!(alarm_id, "Alarm triggered");

        let Some(email) = &self.email else {
            tracing::debug!(alarm_id, "Email delivery not configured, skipping");
            return;
        };
        if let Err(e) = email.deliver(event).await {
            tracing::error!(
                error = %e,
                alarm_id,
                to = email.recipient(),
                "Failed to send alarm email"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
