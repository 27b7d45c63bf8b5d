use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateServiceRequest, UpdateServiceRequest, ListServicesQuery};
use crate::domain::models::service::{Service, MAX_BASE_PRICE};
use crate::domain::services::access::{authorize, permits, Action};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

fn validate_pricing(base_price: i64, duration_min: i32) -> Result<(), AppError> {
    if !(0..=MAX_BASE_PRICE).contains(&base_price) {
        return Err(AppError::Validation(format!("base_price must be between 0 and {}", MAX_BASE_PRICE)));
    }
    if duration_min <= 0 {
        return Err(AppError::Validation("estimated_duration_min must be positive".into()));
    }
    Ok(())
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListServicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let include_inactive = query.include_inactive.unwrap_or(false) && permits(&user.0, Action::ManageCatalogue);
    let services = state.service_repo.list(!include_inactive).await?;
    Ok(Json(services))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&user.0, Action::ManageCatalogue)?;
    if payload.name.trim().is_empty() || payload.category.trim().is_empty() {
        return Err(AppError::Validation("name and category are required".into()));
    }
    validate_pricing(payload.base_price, payload.estimated_duration_min)?;

    let service = Service::new(payload.name, payload.category, payload.base_price, payload.estimated_duration_min);
    let created = state.service_repo.create(&service).await?;
    info!(service_id = %created.id, category = %created.category, "Service created");
    Ok(Json(created))
}

/// Price changes only affect bookings created afterwards.
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(service_id): Path<String>,
    Json(payload): Json<UpdateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&user.0, Action::ManageCatalogue)?;

    let mut service = state.service_repo.find_by_id(&service_id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;

    if let Some(val) = payload.name { service.name = val; }
    if let Some(val) = payload.category { service.category = val.trim().to_lowercase(); }
    if let Some(val) = payload.base_price { service.base_price = val; }
    if let Some(val) = payload.estimated_duration_min { service.estimated_duration_min = val; }
    if let Some(val) = payload.is_active { service.is_active = val; }
    validate_pricing(service.base_price, service.estimated_duration_min)?;
    service.updated_at = Utc::now();

    let updated = state.service_repo.update(&service).await?;
    info!(service_id = %updated.id, base_price = updated.base_price, "Service updated");
    Ok(Json(updated))
}
