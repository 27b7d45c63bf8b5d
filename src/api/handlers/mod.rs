pub mod admin;
pub mod booking;
pub mod dispatch;
pub mod health;
pub mod service;
pub mod technician;

use chrono::{NaiveDate, NaiveTime};
use crate::error::AppError;

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format, expected YYYY-MM-DD".into()))
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppError::Validation("Invalid time format, expected HH:MM".into()))
}
