use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::domain::models::booking::BookingStatus;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    #[error("Booking not found: {0}")]
    BookingNotFound(String),
    #[error("Technician not eligible: {0}")]
    TechnicianNotEligible(String),
    #[error("Technician unavailable: {0}")]
    TechnicianUnavailable(String),
    #[error("Booking already assigned: {0}")]
    AlreadyAssigned(String),
    #[error("Invalid state: booking is {0}")]
    InvalidState(BookingStatus),
    #[error("Cancellation window closed")]
    CancellationWindowClosed,
    #[error("Operation timed out")]
    OperationTimedOut,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::NotAuthorized(_) => "not_authorized",
            AppError::BookingNotFound(_) => "booking_not_found",
            AppError::TechnicianNotEligible(_) => "technician_not_eligible",
            AppError::TechnicianUnavailable(_) => "technician_unavailable",
            AppError::AlreadyAssigned(_) => "already_assigned",
            AppError::InvalidState(_) => "invalid_state",
            AppError::CancellationWindowClosed => "cancellation_window_closed",
            AppError::OperationTimedOut => "operation_timed_out",
            AppError::Database(_) => "database_error",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::InternalWithMsg(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidTransition { from, to } => (
                StatusCode::CONFLICT,
                format!("A booking that is {} cannot be moved to {}.", from, to),
            ),
            AppError::NotAuthorized(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::BookingNotFound(_) => (StatusCode::NOT_FOUND, "Booking not found".to_string()),
            AppError::TechnicianNotEligible(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::TechnicianUnavailable(_) => (
                StatusCode::CONFLICT,
                "The technician is not available right now.".to_string(),
            ),
            AppError::AlreadyAssigned(_) => (
                StatusCode::CONFLICT,
                "This booking is already assigned.".to_string(),
            ),
            AppError::InvalidState(status) => (
                StatusCode::CONFLICT,
                format!("This booking can no longer be changed (it is {}).", status),
            ),
            AppError::CancellationWindowClosed => (
                StatusCode::CONFLICT,
                "Too close to the appointment to cancel.".to_string(),
            ),
            AppError::OperationTimedOut => (
                StatusCode::GATEWAY_TIMEOUT,
                "The request took too long; nothing was changed.".to_string(),
            ),
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)", "code": "duplicate" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
