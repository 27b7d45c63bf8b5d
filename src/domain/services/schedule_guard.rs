use std::sync::Arc;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::info;
use uuid::Uuid;
use crate::domain::models::{
    actor::AuthContext,
    booking::{Booking, BookingStatus},
    lifecycle::RescheduledEvent,
};
use crate::domain::ports::BookingRepository;
use crate::domain::services::locks::exclusive;
use crate::domain::services::access::{authorize, Action};
use crate::domain::services::state_machine::StateMachine;
use crate::error::AppError;

/// Lead-time rule for cancellations, evaluated in the service's local timezone.
#[derive(Debug, Clone, Copy)]
pub struct CancellationPolicy {
    pub window: Duration,
    pub tz: Tz,
}

impl CancellationPolicy {
    pub fn new(window_days: i64, tz: Tz) -> Self {
        Self { window: Duration::days(window_days), tz }
    }

    /// The appointment as an instant. Ambiguous local times resolve to the
    /// earlier one; times skipped by a DST jump are read as UTC.
    pub fn scheduled_at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| local.and_utc())
    }

    pub fn can_cancel(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        booking.status.is_schedulable()
            && self.scheduled_at(booking.scheduled_date, booking.scheduled_time) - now >= self.window
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }
}

pub struct ScheduleGuard {
    booking_repo: Arc<dyn BookingRepository>,
    machine: Arc<StateMachine>,
    policy: CancellationPolicy,
}

impl ScheduleGuard {
    pub fn new(booking_repo: Arc<dyn BookingRepository>, machine: Arc<StateMachine>, policy: CancellationPolicy) -> Self {
        Self { booking_repo, machine, policy }
    }

    pub async fn cancel(&self, booking_id: &str, actor: &AuthContext) -> Result<Booking, AppError> {
        self.cancel_at(booking_id, actor, Utc::now()).await
    }

    pub async fn cancel_at(&self, booking_id: &str, actor: &AuthContext, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let lane = exclusive(self.machine.locks(), booking_id, self.machine.timeout()).await?;
        let booking = lane.bounded(self.machine.load(booking_id)).await?;
        if !booking.status.is_schedulable() {
            return Err(AppError::InvalidState(booking.status));
        }
        authorize(actor, Action::Move(&booking, BookingStatus::Cancelled))?;
        if !self.policy.can_cancel(&booking, now) {
            return Err(AppError::CancellationWindowClosed);
        }

        let released = booking.technician_id.clone();
        let Some(cancelled) = self.booking_repo.cancel(booking_id, booking.status, released.as_deref(), now).await? else {
            return Err(self.machine.rejection(booking_id, false).await);
        };

        info!(booking_id = %booking_id, from = %booking.status, released = ?released, actor = %actor.user_id, "Booking cancelled");
        self.machine
            .emit_with_technician(&cancelled, booking.status, BookingStatus::Cancelled, released, actor, now)
            .await;
        drop(lane);
        Ok(cancelled)
    }

    pub async fn reschedule(&self, booking_id: &str, date: NaiveDate, time: NaiveTime, actor: &AuthContext) -> Result<Booking, AppError> {
        self.reschedule_at(booking_id, date, time, actor, Utc::now()).await
    }

    pub async fn reschedule_at(
        &self,
        booking_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        actor: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let lane = exclusive(self.machine.locks(), booking_id, self.machine.timeout()).await?;
        let previous = lane.bounded(self.machine.load(booking_id)).await?;
        if !previous.status.is_schedulable() {
            return Err(AppError::InvalidState(previous.status));
        }
        authorize(actor, Action::Reschedule(&previous))?;
        if date < self.policy.today(now) {
            return Err(AppError::Validation("New date must be today or later".into()));
        }

        let Some(updated) = self.booking_repo.reschedule(booking_id, previous.status, date, time, now).await? else {
            return Err(self.machine.rejection(booking_id, false).await);
        };

        info!(booking_id = %booking_id, date = %date, time = %time, "Booking rescheduled");
        let event = RescheduledEvent {
            event_id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            previous_date: previous.scheduled_date,
            previous_time: previous.scheduled_time,
            scheduled_date: date,
            scheduled_time: time,
            actor_id: actor.user_id.clone(),
            timestamp: now,
        };
        self.machine.bridge().publish(event.into()).await;
        drop(lane);
        Ok(updated)
    }
}
