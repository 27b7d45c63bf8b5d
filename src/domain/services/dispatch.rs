use std::cmp::Ordering;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use crate::domain::models::{
    actor::AuthContext,
    booking::{Booking, BookingStatus},
    lifecycle::ReassignedEvent,
    technician::{AvailabilityStatus, Technician},
};
use crate::domain::ports::{BookingRepository, ServiceRepository, TechnicianRepository};
use crate::domain::services::access::{authorize, Action};
use crate::domain::services::locks::exclusive;
use crate::domain::services::skills::required_skills;
use crate::domain::services::state_machine::StateMachine;
use crate::error::AppError;
use uuid::Uuid;

/// Dispatch order: rating desc, completed jobs desc, oldest profile first.
/// The id breaks any remaining tie so the order is total.
pub fn rank(a: &Technician, b: &Technician) -> Ordering {
    b.rating.total_cmp(&a.rating)
        .then_with(|| b.completed_jobs.cmp(&a.completed_jobs))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Checks one technician against a booking's location and service category.
pub fn check_eligibility(technician: &Technician, booking: &Booking, category: &str) -> Result<(), AppError> {
    if !technician.is_active || !technician.is_verified {
        return Err(AppError::TechnicianNotEligible(format!(
            "Technician {} is not an active verified technician", technician.id
        )));
    }
    if !technician.covers_area(&booking.service_city) {
        return Err(AppError::TechnicianNotEligible(format!(
            "Technician {} does not serve {}", technician.id, booking.service_city
        )));
    }
    if !technician.has_any_skill(&required_skills(category)) {
        return Err(AppError::TechnicianNotEligible(format!(
            "Technician {} lacks the skills for {}", technician.id, category
        )));
    }
    if technician.availability_status != AvailabilityStatus::Available {
        return Err(AppError::TechnicianUnavailable(technician.id.clone()));
    }
    Ok(())
}

pub struct DispatchService {
    booking_repo: Arc<dyn BookingRepository>,
    technician_repo: Arc<dyn TechnicianRepository>,
    service_repo: Arc<dyn ServiceRepository>,
    machine: Arc<StateMachine>,
}

impl DispatchService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        technician_repo: Arc<dyn TechnicianRepository>,
        service_repo: Arc<dyn ServiceRepository>,
        machine: Arc<StateMachine>,
    ) -> Self {
        Self { booking_repo, technician_repo, service_repo, machine }
    }

    async fn category_of(&self, booking: &Booking) -> Result<String, AppError> {
        let service = self.service_repo.find_by_id(&booking.service_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", booking.service_id)))?;
        Ok(service.category)
    }

    /// Read-only; takes no lock.
    pub async fn find_eligible(&self, booking: &Booking) -> Result<Vec<Technician>, AppError> {
        let category = self.category_of(booking).await?;
        let mut candidates: Vec<Technician> = self.technician_repo.list_dispatchable().await?
            .into_iter()
            .filter(|t| check_eligibility(t, booking, &category).is_ok())
            .collect();
        candidates.sort_by(rank);
        Ok(candidates)
    }

    pub async fn find_eligible_for(&self, booking_id: &str) -> Result<Vec<Technician>, AppError> {
        let booking = self.machine.load(booking_id).await?;
        self.find_eligible(&booking).await
    }

    async fn load_technician(&self, technician_id: &str) -> Result<Technician, AppError> {
        self.technician_repo.find_by_id(technician_id).await?
            .ok_or_else(|| AppError::TechnicianNotEligible(format!("Unknown technician {}", technician_id)))
    }

    pub async fn assign(&self, booking_id: &str, technician_id: &str, actor: &AuthContext) -> Result<Booking, AppError> {
        self.assign_at(booking_id, technician_id, actor, Utc::now()).await
    }

    #[instrument(skip(self, actor, now), fields(actor = %actor.user_id))]
    pub async fn assign_at(
        &self,
        booking_id: &str,
        technician_id: &str,
        actor: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        authorize(actor, Action::Dispatch)?;

        let lane = exclusive(self.machine.locks(), booking_id, self.machine.timeout()).await?;
        let booking = lane.bounded(async {
            let booking = self.machine.load(booking_id).await?;
            if booking.status.is_terminal() {
                return Err(AppError::InvalidState(booking.status));
            }
            if booking.technician_id.is_some() {
                return Err(AppError::AlreadyAssigned(booking_id.to_string()));
            }
            if !matches!(booking.status, BookingStatus::Pending | BookingStatus::Confirmed) {
                return Err(AppError::InvalidState(booking.status));
            }

            let technician = self.load_technician(technician_id).await?;
            let category = self.category_of(&booking).await?;
            check_eligibility(&technician, &booking, &category)?;
            Ok(booking)
        }).await?;

        let Some(assigned) = self.booking_repo.claim_technician(booking_id, technician_id, now).await? else {
            return Err(self.machine.rejection(booking_id, true).await);
        };

        info!(booking_id = %booking_id, technician_id = %technician_id, "Technician assigned");
        // A pending booking is confirmed on the way; history keeps both edges.
        if booking.status == BookingStatus::Pending {
            self.machine.emit(&assigned, BookingStatus::Pending, BookingStatus::Confirmed, actor, now).await;
        }
        self.machine.emit(&assigned, BookingStatus::Confirmed, BookingStatus::Assigned, actor, now).await;
        drop(lane);
        Ok(assigned)
    }

    pub async fn reassign(&self, booking_id: &str, technician_id: &str, actor: &AuthContext) -> Result<Booking, AppError> {
        self.reassign_at(booking_id, technician_id, actor, Utc::now()).await
    }

    /// Swaps the bound technician on an assigned booking. The status is
    /// unchanged, so a `ReassignedEvent` is published instead of a lifecycle event.
    #[instrument(skip(self, actor, now), fields(actor = %actor.user_id))]
    pub async fn reassign_at(
        &self,
        booking_id: &str,
        technician_id: &str,
        actor: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        authorize(actor, Action::Dispatch)?;

        let lane = exclusive(self.machine.locks(), booking_id, self.machine.timeout()).await?;
        let previous = lane.bounded(async {
            let booking = self.machine.load(booking_id).await?;
            if booking.status != BookingStatus::Assigned {
                return Err(AppError::InvalidState(booking.status));
            }
            let Some(previous) = booking.technician_id.clone() else {
                return Err(AppError::InvalidState(booking.status));
            };
            if previous == technician_id {
                return Err(AppError::AlreadyAssigned(booking_id.to_string()));
            }

            let technician = self.load_technician(technician_id).await?;
            let category = self.category_of(&booking).await?;
            check_eligibility(&technician, &booking, &category)?;
            Ok(previous)
        }).await?;

        let Some(swapped) = self.booking_repo.swap_technician(booking_id, &previous, technician_id, now).await? else {
            return Err(self.machine.rejection(booking_id, false).await);
        };

        info!(booking_id = %booking_id, from = %previous, to = %technician_id, "Technician reassigned");
        let event = ReassignedEvent {
            event_id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            previous_technician_id: previous,
            technician_id: technician_id.to_string(),
            actor_id: actor.user_id.clone(),
            timestamp: now,
        };
        self.machine.bridge().publish(event.into()).await;
        drop(lane);
        Ok(swapped)
    }

    pub async fn auto_assign(&self, booking_id: &str, actor: &AuthContext) -> Result<Booking, AppError> {
        self.auto_assign_at(booking_id, actor, Utc::now()).await
    }

    /// Tries candidates in rank order. Candidates that changed since ranking
    /// are skipped; a booking that got assigned meanwhile stops the walk.
    pub async fn auto_assign_at(&self, booking_id: &str, actor: &AuthContext, now: DateTime<Utc>) -> Result<Booking, AppError> {
        authorize(actor, Action::Dispatch)?;

        let candidates = self.find_eligible_for(booking_id).await?;
        for candidate in &candidates {
            match self.assign_at(booking_id, &candidate.id, actor, now).await {
                Ok(booking) => return Ok(booking),
                Err(AppError::TechnicianUnavailable(_)) | Err(AppError::TechnicianNotEligible(_)) => {
                    warn!(booking_id = %booking_id, technician_id = %candidate.id, "Candidate no longer assignable, trying next");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::TechnicianNotEligible(format!("No eligible technician for booking {}", booking_id)))
    }
}
