use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, booking, dispatch, health, service, technician};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Catalogue
        .route("/api/v1/services", get(service::list_services).post(service::create_service))
        .route("/api/v1/services/{service_id}", put(service::update_service))

        // Technicians
        .route("/api/v1/technicians", post(technician::create_technician))
        .route("/api/v1/technicians/{technician_id}", get(technician::get_technician).put(technician::update_technician))
        .route("/api/v1/technicians/{technician_id}/availability", put(technician::update_availability))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking).get(booking::list_bookings))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/{booking_id}/transition", post(booking::transition_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/reschedule", post(booking::reschedule_booking))

        // Dispatch
        .route("/api/v1/bookings/{booking_id}/eligible", get(dispatch::list_eligible))
        .route("/api/v1/bookings/{booking_id}/assign", post(dispatch::assign_technician))
        .route("/api/v1/bookings/{booking_id}/reassign", post(dispatch::reassign_technician))
        .route("/api/v1/bookings/{booking_id}/auto-assign", post(dispatch::auto_assign))

        // Dashboard
        .route("/api/v1/admin/stats", get(admin::stats))
        .route("/api/v1/admin/bookings/{booking_id}/events", get(admin::booking_events))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                        role = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}