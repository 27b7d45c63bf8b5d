use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::responses::StatsResponse;
use crate::domain::models::{booking::BookingStatus, technician::AvailabilityStatus};
use crate::domain::services::access::{authorize, Action};
use crate::error::AppError;
use std::collections::BTreeMap;
use std::sync::Arc;

pub async fn stats(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    authorize(&actor, Action::ViewOperations)?;

    let mut bookings: BTreeMap<&'static str, i64> =
        BookingStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for (status, count) in state.booking_repo.count_by_status().await? {
        bookings.insert(status.as_str(), count);
    }

    let mut technicians: BTreeMap<&'static str, i64> =
        AvailabilityStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for (status, count) in state.technician_repo.count_by_availability().await? {
        technicians.insert(status.as_str(), count);
    }

    Ok(Json(StatsResponse { bookings, technicians }))
}

/// Published events for one booking, oldest first, with delivery state.
pub async fn booking_events(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&actor, Action::ViewOperations)?;
    let events = state.outbox_repo.list_by_booking(&booking_id).await?;
    Ok(Json(events))
}
