use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Minor currency units.
    pub base_price: i64,
    pub estimated_duration_min: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upper bound for catalogue prices, in minor units.
pub const MAX_BASE_PRICE: i64 = 1_000_000_000_000;

impl Service {
    pub fn new(name: String, category: String, base_price: i64, estimated_duration_min: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            category: category.trim().to_lowercase(),
            base_price,
            estimated_duration_min,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
