use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateTechnicianRequest, UpdateAvailabilityRequest, UpdateTechnicianRequest};
use sqlx::types::Json as SqlJson;
use crate::domain::models::technician::{NewTechnicianParams, Technician};
use crate::domain::services::access::{authorize, Action};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn create_technician(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<CreateTechnicianRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&actor, Action::ManageTechnicians)?;
    if payload.display_name.trim().is_empty() {
        return Err(AppError::Validation("display_name is required".into()));
    }
    if payload.service_areas.is_empty() || payload.skills.is_empty() {
        return Err(AppError::Validation("skills and service_areas must not be empty".into()));
    }
    let rating = payload.rating.unwrap_or(0.0);
    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::Validation("rating must be between 0 and 5".into()));
    }

    let technician = Technician::new(NewTechnicianParams {
        id: payload.id,
        display_name: payload.display_name,
        skills: payload.skills,
        service_areas: payload.service_areas,
        rating,
        is_verified: payload.is_verified.unwrap_or(false),
    });

    let created = state.technician_repo.create(&technician).await?;
    info!(technician_id = %created.id, "Technician onboarded");
    Ok(Json(created))
}

pub async fn get_technician(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(technician_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let technician = state.technician_repo.find_by_id(&technician_id).await?
        .ok_or(AppError::NotFound("Technician not found".into()))?;
    Ok(Json(technician))
}

/// Profile changes by an admin; counters are never written here.
pub async fn update_technician(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(technician_id): Path<String>,
    Json(payload): Json<UpdateTechnicianRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&actor, Action::ManageTechnicians)?;

    let mut technician = state.technician_repo.find_by_id(&technician_id).await?
        .ok_or(AppError::NotFound("Technician not found".into()))?;

    if let Some(val) = payload.display_name { technician.display_name = val; }
    if let Some(val) = payload.skills { technician.skills = SqlJson(val); }
    if let Some(val) = payload.service_areas { technician.service_areas = SqlJson(val); }
    if let Some(val) = payload.rating {
        if !(0.0..=5.0).contains(&val) {
            return Err(AppError::Validation("rating must be between 0 and 5".into()));
        }
        technician.rating = val;
    }
    if let Some(val) = payload.is_verified { technician.is_verified = val; }
    if let Some(val) = payload.is_active { technician.is_active = val; }
    technician.updated_at = Utc::now();

    let updated = state.technician_repo.update(&technician).await?;
    info!(technician_id = %updated.id, verified = updated.is_verified, active = updated.is_active, "Technician updated");
    Ok(Json(updated))
}

/// Availability is managed independently of assignment.
pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(technician_id): Path<String>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&actor, Action::SetAvailability { technician_id: &technician_id })?;

    let updated = state.technician_repo.update_availability(&technician_id, payload.status, Utc::now()).await?
        .ok_or(AppError::NotFound("Technician not found".into()))?;
    info!(technician_id = %technician_id, status = payload.status.as_str(), "Availability updated");
    Ok(Json(updated))
}
