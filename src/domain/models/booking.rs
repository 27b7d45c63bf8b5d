use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use std::fmt;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Assigned,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Assigned => "assigned",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Statuses from which the schedule may still change.
    pub fn is_schedulable(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Assigned)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown booking status '{}'", s))
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub client_id: String,
    pub technician_id: Option<String>,
    pub service_id: String,
    pub status: BookingStatus,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub service_address: String,
    pub service_city: String,
    pub service_latitude: Option<f64>,
    pub service_longitude: Option<f64>,
    pub notes: Option<String>,
    /// Price in minor currency units, copied from the service at creation.
    pub total_price: i64,
    pub commission: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub client_id: String,
    pub service_id: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub address: String,
    pub city: String,
    pub coordinates: Option<(f64, f64)>,
    pub notes: Option<String>,
    pub total_price: i64,
    pub commission: Option<i64>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();
        let (latitude, longitude) = match params.coordinates {
            Some((lat, lng)) => (Some(lat), Some(lng)),
            None => (None, None),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            client_id: params.client_id,
            technician_id: None,
            service_id: params.service_id,
            status: BookingStatus::Pending,
            scheduled_date: params.scheduled_date,
            scheduled_time: params.scheduled_time,
            service_address: params.address,
            service_city: params.city,
            service_latitude: latitude,
            service_longitude: longitude,
            notes: params.notes,
            total_price: params.total_price,
            commission: params.commission,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount credited to the technician when the job completes.
    pub fn technician_payout(&self) -> i64 {
        self.total_price - self.commission.unwrap_or(0)
    }
}

/// Commission in minor units for a price and a rate in basis points.
pub fn commission_for(total_price: i64, commission_bps: i64) -> Result<i64, AppError> {
    total_price
        .checked_mul(commission_bps)
        .map(|scaled| scaled / 10_000)
        .ok_or_else(|| AppError::Validation(format!("Price {} is too large to book", total_price)))
}
