use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::AssignRequest;
use crate::domain::services::access::{authorize, Action};
use crate::error::AppError;
use std::sync::Arc;

pub async fn list_eligible(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&actor, Action::Dispatch)?;
    let candidates = state.dispatch.find_eligible_for(&booking_id).await?;
    Ok(Json(candidates))
}

pub async fn assign_technician(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<AssignRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.dispatch.assign(&booking_id, &payload.technician_id, &actor).await?;
    Ok(Json(booking))
}

pub async fn reassign_technician(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<AssignRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.dispatch.reassign(&booking_id, &payload.technician_id, &actor).await?;
    Ok(Json(booking))
}

pub async fn auto_assign(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.dispatch.auto_assign(&booking_id, &actor).await?;
    Ok(Json(booking))
}
