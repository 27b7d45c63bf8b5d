use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateBookingRequest, TransitionRequest, RescheduleRequest};
use crate::api::handlers::{parse_date, parse_time};
use crate::domain::models::booking::BookingStatus;
use crate::domain::services::booking_service::CreateBooking;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let coordinates = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        (None, None) => None,
        _ => return Err(AppError::Validation("latitude and longitude must be given together".into())),
    };

    let input = CreateBooking {
        client_id: payload.client_id,
        service_id: payload.service_id,
        scheduled_date: parse_date(&payload.date)?,
        scheduled_time: parse_time(&payload.time)?,
        address: payload.address,
        city: payload.city,
        coordinates,
        notes: payload.notes,
    };

    let booking = state.booking_service.create(&actor, input).await?;
    Ok(Json(booking))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_service.list(&actor).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.get(&booking_id, &actor).await?;
    Ok(Json(booking))
}

/// Generic status change. Cancellation is routed through the schedule guard
/// so the lead-time rule always applies.
pub async fn transition_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!("transition_booking: {} -> {}", booking_id, payload.status);

    let booking = match payload.status {
        BookingStatus::Cancelled => state.schedule_guard.cancel(&booking_id, &actor).await?,
        target => state.state_machine.transition(&booking_id, target, &actor).await?,
    };
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.schedule_guard.cancel(&booking_id, &actor).await?;
    Ok(Json(booking))
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&payload.date)?;
    let time = parse_time(&payload.time)?;

    let booking = state.schedule_guard.reschedule(&booking_id, date, time, &actor).await?;
    Ok(Json(booking))
}
