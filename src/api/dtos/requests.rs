use crate::domain::models::{booking::BookingStatus, technician::AvailabilityStatus};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub category: String,
    pub base_price: i64,
    pub estimated_duration_min: i32,
}

#[derive(Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub base_price: Option<i64>,
    pub estimated_duration_min: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct ListServicesQuery {
    pub include_inactive: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateTechnicianRequest {
    /// Identity-layer user id of the technician; generated when absent.
    pub id: Option<String>,
    pub display_name: String,
    pub skills: Vec<String>,
    pub service_areas: Vec<String>,
    pub rating: Option<f64>,
    pub is_verified: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub status: AvailabilityStatus,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub client_id: Option<String>,
    pub service_id: String,
    pub date: String,
    pub time: String,
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub technician_id: String,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: BookingStatus,
}

#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub date: String,
    pub time: String,
}

#[derive(Deserialize)]
pub struct UpdateTechnicianRequest {
    pub display_name: Option<String>,
    pub skills: Option<Vec<String>>,
    pub service_areas: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
}
