use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Busy,
    Offline,
}

impl AvailabilityStatus {
    pub const ALL: [AvailabilityStatus; 3] = [
        AvailabilityStatus::Available,
        AvailabilityStatus::Busy,
        AvailabilityStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Busy => "busy",
            AvailabilityStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Technician {
    pub id: String,
    pub display_name: String,
    pub skills: Json<Vec<String>>,
    pub service_areas: Json<Vec<String>>,
    pub availability_status: AvailabilityStatus,
    pub rating: f64,
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub active_jobs: i64,
    pub earnings: i64,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewTechnicianParams {
    /// Identity-layer user id; technicians act under this id.
    pub id: Option<String>,
    pub display_name: String,
    pub skills: Vec<String>,
    pub service_areas: Vec<String>,
    pub rating: f64,
    pub is_verified: bool,
}

impl Technician {
    pub fn new(params: NewTechnicianParams) -> Self {
        let now = Utc::now();
        Self {
            id: params.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            display_name: params.display_name,
            skills: Json(params.skills),
            service_areas: Json(params.service_areas),
            availability_status: AvailabilityStatus::Available,
            rating: params.rating.clamp(0.0, 5.0),
            total_jobs: 0,
            completed_jobs: 0,
            active_jobs: 0,
            earnings: 0,
            is_verified: params.is_verified,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn covers_area(&self, city: &str) -> bool {
        self.service_areas.iter().any(|area| area.eq_ignore_ascii_case(city.trim()))
    }

    pub fn has_any_skill(&self, required: &[&str]) -> bool {
        self.skills.iter().any(|skill| required.iter().any(|r| skill.eq_ignore_ascii_case(r)))
    }
}
