use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crate::domain::models::booking::BookingStatus;

/// Published once per accepted status transition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub event_id: String,
    pub booking_id: String,
    pub from_status: BookingStatus,
    pub to_status: BookingStatus,
    /// Technician bound to the booking, or released by a cancellation.
    pub technician_id: Option<String>,
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(
        booking_id: &str,
        from_status: BookingStatus,
        to_status: BookingStatus,
        technician_id: Option<String>,
        actor_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            from_status,
            to_status,
            technician_id,
            actor_id: actor_id.to_string(),
            timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RescheduledEvent {
    pub event_id: String,
    pub booking_id: String,
    pub previous_date: NaiveDate,
    pub previous_time: NaiveTime,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReassignedEvent {
    pub event_id: String,
    pub booking_id: String,
    pub previous_technician_id: String,
    pub technician_id: String,
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Lifecycle(LifecycleEvent),
    Rescheduled(RescheduledEvent),
    Reassigned(ReassignedEvent),
}

impl DomainEvent {
    pub fn event_id(&self) -> &str {
        match self {
            DomainEvent::Lifecycle(e) => &e.event_id,
            DomainEvent::Rescheduled(e) => &e.event_id,
            DomainEvent::Reassigned(e) => &e.event_id,
        }
    }

    pub fn booking_id(&self) -> &str {
        match self {
            DomainEvent::Lifecycle(e) => &e.booking_id,
            DomainEvent::Rescheduled(e) => &e.booking_id,
            DomainEvent::Reassigned(e) => &e.booking_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::Lifecycle(_) => "lifecycle",
            DomainEvent::Rescheduled(_) => "rescheduled",
            DomainEvent::Reassigned(_) => "reassigned",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::Lifecycle(e) => e.timestamp,
            DomainEvent::Rescheduled(e) => e.timestamp,
            DomainEvent::Reassigned(e) => e.timestamp,
        }
    }
}

impl From<LifecycleEvent> for DomainEvent {
    fn from(event: LifecycleEvent) -> Self {
        DomainEvent::Lifecycle(event)
    }
}

impl From<RescheduledEvent> for DomainEvent {
    fn from(event: RescheduledEvent) -> Self {
        DomainEvent::Rescheduled(event)
    }
}

impl From<ReassignedEvent> for DomainEvent {
    fn from(event: ReassignedEvent) -> Self {
        DomainEvent::Reassigned(event)
    }
}
