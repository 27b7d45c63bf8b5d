use crate::domain::models::{
    booking::{Booking, BookingStatus},
    technician::{AvailabilityStatus, Technician},
    service::Service,
    lifecycle::DomainEvent,
    outbox::OutboxEvent,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Durable booking storage. Every mutating method is a single conditional
/// write (or one transaction) and returns `None` when its guard rejects the
/// row, leaving it untouched.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_by_technician(&self, technician_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_all(&self) -> Result<Vec<Booking>, AppError>;

    async fn update_status(&self, id: &str, from: BookingStatus, to: BookingStatus, at: DateTime<Utc>) -> Result<Option<Booking>, AppError>;

    /// in_progress -> completed, crediting the bound technician in the same transaction.
    async fn complete(&self, id: &str, technician_id: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError>;

    /// Binds a technician only while `technician_id IS NULL` and the booking is pending or confirmed.
    async fn claim_technician(&self, id: &str, technician_id: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError>;

    /// Replaces `previous` with `next` on an assigned booking, moving the load counter.
    async fn swap_technician(&self, id: &str, previous: &str, next: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError>;

    /// Cancels from `from` while `technician_id` still equals `bound`, clearing and releasing that technician.
    async fn cancel(&self, id: &str, from: BookingStatus, bound: Option<&str>, at: DateTime<Utc>) -> Result<Option<Booking>, AppError>;

    async fn reschedule(&self, id: &str, from: BookingStatus, date: NaiveDate, time: NaiveTime, at: DateTime<Utc>) -> Result<Option<Booking>, AppError>;

    async fn count_by_status(&self) -> Result<Vec<(BookingStatus, i64)>, AppError>;
}

#[async_trait]
pub trait TechnicianRepository: Send + Sync {
    async fn create(&self, technician: &Technician) -> Result<Technician, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Technician>, AppError>;
    /// Active, verified and available technicians; area and skill matching happen in the caller.
    async fn list_dispatchable(&self) -> Result<Vec<Technician>, AppError>;
    async fn update(&self, technician: &Technician) -> Result<Technician, AppError>;
    async fn update_availability(&self, id: &str, status: AvailabilityStatus, at: DateTime<Utc>) -> Result<Option<Technician>, AppError>;
    async fn count_by_availability(&self) -> Result<Vec<(AvailabilityStatus, i64)>, AppError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create(&self, service: &Service) -> Result<Service, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError>;
    async fn list(&self, active_only: bool) -> Result<Vec<Service>, AppError>;
    async fn update(&self, service: &Service) -> Result<Service, AppError>;
}

#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn enqueue(&self, event: &OutboxEvent) -> Result<(), AppError>;
    /// Claims due PENDING rows, plus PROCESSING rows whose claim is older than `stale_before`.
    async fn claim_due(&self, limit: i32, now: DateTime<Utc>, stale_before: DateTime<Utc>) -> Result<Vec<OutboxEvent>, AppError>;
    async fn mark_delivered(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
    async fn schedule_retry(&self, id: &str, attempts: i32, next_attempt_at: DateTime<Utc>, error: &str) -> Result<(), AppError>;
    async fn mark_failed(&self, id: &str, attempts: i32, error: &str) -> Result<(), AppError>;
    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<OutboxEvent>, AppError>;
}

/// Outbound edge of the core. Fire-and-forget: implementations must not
/// block on the consumer and must swallow their own failures.
#[async_trait]
pub trait NotificationBridge: Send + Sync {
    async fn publish(&self, event: DomainEvent);
}

/// Downstream transport the outbox relay delivers to.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &DomainEvent) -> Result<(), AppError>;
}
