use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use crate::domain::models::{
    actor::AuthContext,
    booking::{Booking, BookingStatus},
    lifecycle::LifecycleEvent,
};
use crate::domain::ports::{BookingRepository, NotificationBridge};
use crate::domain::services::access::{authorize, Action};
use crate::domain::services::locks::{exclusive, BookingLocks};
use crate::error::AppError;

use BookingStatus::*;

/// Every legal edge. Terminal states have none.
pub const EDGES: [(BookingStatus, BookingStatus); 7] = [
    (Pending, Confirmed),
    (Pending, Cancelled),
    (Confirmed, Assigned),
    (Confirmed, Cancelled),
    (Assigned, Cancelled),
    (Assigned, InProgress),
    (InProgress, Completed),
];

pub fn is_legal(from: BookingStatus, to: BookingStatus) -> bool {
    EDGES.contains(&(from, to))
}

/// Table check first, then the actor.
pub fn validate(booking: &Booking, to: BookingStatus, actor: &AuthContext) -> Result<(), AppError> {
    if !is_legal(booking.status, to) {
        return Err(AppError::InvalidTransition { from: booking.status, to });
    }
    authorize(actor, Action::Move(booking, to))
}

pub struct StateMachine {
    booking_repo: Arc<dyn BookingRepository>,
    bridge: Arc<dyn NotificationBridge>,
    locks: BookingLocks,
    timeout: Duration,
}

impl StateMachine {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        bridge: Arc<dyn NotificationBridge>,
        locks: BookingLocks,
        timeout: Duration,
    ) -> Self {
        Self { booking_repo, bridge, locks, timeout }
    }

    pub fn locks(&self) -> &BookingLocks {
        &self.locks
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn load(&self, booking_id: &str) -> Result<Booking, AppError> {
        self.booking_repo.find_by_id(booking_id).await?
            .ok_or_else(|| AppError::BookingNotFound(booking_id.to_string()))
    }

    pub async fn transition(&self, booking_id: &str, target: BookingStatus, actor: &AuthContext) -> Result<Booking, AppError> {
        self.transition_at(booking_id, target, actor, Utc::now()).await
    }

    /// Applies a status-only edge. `now` is used for every comparison and for
    /// updated_at. The event is published before the booking lock is released.
    pub async fn transition_at(
        &self,
        booking_id: &str,
        target: BookingStatus,
        actor: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let lane = exclusive(&self.locks, booking_id, self.timeout).await?;
        let booking = lane.bounded(self.load(booking_id)).await?;
        validate(&booking, target, actor)?;

        let written = match target {
            Assigned => {
                return Err(AppError::Validation("Binding a technician requires the assign operation".into()));
            }
            Cancelled => {
                return Err(AppError::Validation("Cancellation requires the cancel operation".into()));
            }
            Completed => {
                let technician_id = booking.technician_id.as_deref()
                    .ok_or(AppError::InvalidState(booking.status))?;
                self.booking_repo.complete(booking_id, technician_id, now).await?
            }
            _ => self.booking_repo.update_status(booking_id, booking.status, target, now).await?,
        };
        let Some(updated) = written else {
            return Err(self.rejection(booking_id, false).await);
        };

        info!(booking_id = %booking_id, from = %booking.status, to = %target, actor = %actor.user_id, "Booking transitioned");
        self.emit(&updated, booking.status, target, actor, now).await;
        drop(lane);
        Ok(updated)
    }

    /// Publishes one lifecycle event for an edge that has already been persisted.
    pub async fn emit(&self, booking: &Booking, from: BookingStatus, to: BookingStatus, actor: &AuthContext, at: DateTime<Utc>) {
        let technician_id = booking.technician_id.clone();
        self.emit_with_technician(booking, from, to, technician_id, actor, at).await;
    }

    pub async fn emit_with_technician(
        &self,
        booking: &Booking,
        from: BookingStatus,
        to: BookingStatus,
        technician_id: Option<String>,
        actor: &AuthContext,
        at: DateTime<Utc>,
    ) {
        let event = LifecycleEvent::new(&booking.id, from, to, technician_id, &actor.user_id, at);
        self.bridge.publish(event.into()).await;
    }

    /// Explains why a guarded write matched no row. Only assignment reports a
    /// bound technician as `AlreadyAssigned`.
    pub async fn rejection(&self, booking_id: &str, assigning: bool) -> AppError {
        match self.booking_repo.find_by_id(booking_id).await {
            Ok(Some(current)) => {
                warn!(booking_id = %booking_id, status = %current.status, "Conditional write lost to a concurrent change");
                if assigning && current.technician_id.is_some() && !current.status.is_terminal() {
                    AppError::AlreadyAssigned(booking_id.to_string())
                } else {
                    AppError::InvalidState(current.status)
                }
            }
            Ok(None) => AppError::BookingNotFound(booking_id.to_string()),
            Err(e) => e,
        }
    }

    pub fn bridge(&self) -> &Arc<dyn NotificationBridge> {
        &self.bridge
    }
}
