use std::sync::Arc;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::info;
use crate::domain::models::{
    actor::{AuthContext, Role},
    booking::{commission_for, Booking, NewBookingParams},
};
use crate::domain::ports::{BookingRepository, ServiceRepository};
use crate::domain::services::access::{authorize, Action};
use crate::domain::services::schedule_guard::CancellationPolicy;
use crate::error::AppError;

pub struct CreateBooking {
    /// Only honoured for admins booking on a client's behalf.
    pub client_id: Option<String>,
    pub service_id: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub address: String,
    pub city: String,
    pub coordinates: Option<(f64, f64)>,
    pub notes: Option<String>,
}

/// Booking intake and role-scoped reads. Price and commission are copied
/// from the service once, at creation.
pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    service_repo: Arc<dyn ServiceRepository>,
    policy: CancellationPolicy,
    commission_bps: i64,
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        service_repo: Arc<dyn ServiceRepository>,
        policy: CancellationPolicy,
        commission_bps: i64,
    ) -> Self {
        Self { booking_repo, service_repo, policy, commission_bps }
    }

    pub async fn create(&self, actor: &AuthContext, input: CreateBooking) -> Result<Booking, AppError> {
        self.create_at(actor, input, Utc::now()).await
    }

    pub async fn create_at(&self, actor: &AuthContext, input: CreateBooking, now: DateTime<Utc>) -> Result<Booking, AppError> {
        authorize(actor, Action::Book)?;
        let client_id = match (actor.role, input.client_id) {
            (Role::Admin, Some(client_id)) => client_id,
            (Role::Admin, None) => return Err(AppError::Validation("client_id is required".into())),
            _ => actor.user_id.clone(),
        };

        if input.address.trim().is_empty() || input.city.trim().is_empty() {
            return Err(AppError::Validation("Address and city are required".into()));
        }
        if input.scheduled_date < self.policy.today(now) {
            return Err(AppError::Validation("Scheduled date must be today or later".into()));
        }

        let service = self.service_repo.find_by_id(&input.service_id).await?
            .filter(|s| s.is_active)
            .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

        let commission = commission_for(service.base_price, self.commission_bps)?;
        let booking = Booking::new(NewBookingParams {
            client_id,
            service_id: service.id.clone(),
            scheduled_date: input.scheduled_date,
            scheduled_time: input.scheduled_time,
            address: input.address.trim().to_string(),
            city: input.city.trim().to_string(),
            coordinates: input.coordinates,
            notes: input.notes,
            total_price: service.base_price,
            commission: Some(commission),
        });

        let created = self.booking_repo.create(&booking).await?;
        info!(booking_id = %created.id, client_id = %created.client_id, service_id = %service.id, total_price = created.total_price, "Booking created");
        Ok(created)
    }

    pub async fn get(&self, booking_id: &str, actor: &AuthContext) -> Result<Booking, AppError> {
        let booking = self.booking_repo.find_by_id(booking_id).await?
            .ok_or_else(|| AppError::BookingNotFound(booking_id.to_string()))?;
        authorize(actor, Action::View(&booking))?;
        Ok(booking)
    }

    pub async fn list(&self, actor: &AuthContext) -> Result<Vec<Booking>, AppError> {
        match actor.role {
            Role::Admin => self.booking_repo.list_all().await,
            Role::Client => self.booking_repo.list_by_client(&actor.user_id).await,
            Role::Technician => self.booking_repo.list_by_technician(&actor.user_id).await,
        }
    }
}
