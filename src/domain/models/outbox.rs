use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use crate::domain::models::lifecycle::DomainEvent;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct OutboxEvent {
    pub id: String, // equals the event id consumers dedupe on
    pub booking_id: String,
    pub event_type: String,
    pub payload: Json<DomainEvent>,
    pub status: String, // PENDING, PROCESSING, DELIVERED, FAILED
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl OutboxEvent {
    pub fn new(event: DomainEvent) -> Self {
        let now = Utc::now();
        Self {
            id: event.event_id().to_string(),
            booking_id: event.booking_id().to_string(),
            event_type: event.kind().to_string(),
            payload: Json(event),
            status: "PENDING".to_string(),
            attempts: 0,
            next_attempt_at: now,
            last_error: None,
            claimed_at: None,
            created_at: now,
            delivered_at: None,
        }
    }
}
