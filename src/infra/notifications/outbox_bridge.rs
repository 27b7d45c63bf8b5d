use std::sync::Arc;
use async_trait::async_trait;
use tracing::{debug, error};
use crate::domain::models::{lifecycle::DomainEvent, outbox::OutboxEvent};
use crate::domain::ports::{NotificationBridge, OutboxRepository};

/// Persists published events for the relay worker. Called after the
/// originating write has committed, so a failure here never undoes it.
pub struct OutboxBridge {
    outbox_repo: Arc<dyn OutboxRepository>,
}

impl OutboxBridge {
    pub fn new(outbox_repo: Arc<dyn OutboxRepository>) -> Self {
        Self { outbox_repo }
    }
}

#[async_trait]
impl NotificationBridge for OutboxBridge {
    async fn publish(&self, event: DomainEvent) {
        let row = OutboxEvent::new(event);
        match self.outbox_repo.enqueue(&row).await {
            Ok(()) => debug!(event_id = %row.id, event_type = %row.event_type, booking_id = %row.booking_id, "Event queued"),
            Err(e) => error!(event_id = %row.id, booking_id = %row.booking_id, "Failed to queue event: {:?}", e),
        }
    }
}
