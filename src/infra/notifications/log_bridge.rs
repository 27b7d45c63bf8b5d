use async_trait::async_trait;
use tracing::{info, warn};
use crate::domain::models::lifecycle::DomainEvent;
use crate::domain::ports::NotificationBridge;

/// Writes events to the tracing pipeline only. Used when no downstream
/// consumer is configured.
pub struct LogBridge;

#[async_trait]
impl NotificationBridge for LogBridge {
    async fn publish(&self, event: DomainEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => info!(
                event_id = %event.event_id(),
                event_type = event.kind(),
                booking_id = %event.booking_id(),
                payload = %payload,
                "Booking event"
            ),
            Err(e) => warn!(event_id = %event.event_id(), "Could not serialize event: {}", e),
        }
    }
}
