mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{far_date, TestApp};
use dispatch_backend::{error::AppError, state::AppState};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_requests_without_valid_token_are_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app.call("GET", "/api/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("GET", "/api/v1/bookings", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_accepted_from_cookie() {
    let app = TestApp::new().await;
    let token = app.token("client-1", "client");

    let res = app.router.clone().oneshot(
        Request::builder()
            .method("GET")
            .uri("/api/v1/bookings")
            .header(header::COOKIE, format!("access_token={}", token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_price_is_snapshotted_at_booking_time() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "admin");
    let client = app.token("client-1", "client");

    let (status, service) = app.call("POST", "/api/v1/services", Some(&admin), Some(json!({
        "name": "Aircon cleaning", "category": "Aircon", "base_price": 800, "estimated_duration_min": 60
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(service["category"], "aircon");
    let service_id = service["id"].as_str().unwrap().to_string();

    let (status, booking) = app.call("POST", "/api/v1/bookings", Some(&client), Some(json!({
        "service_id": service_id,
        "date": far_date().format("%Y-%m-%d").to_string(),
        "time": "10:00",
        "address": "5 Rada St",
        "city": "Makati"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["total_price"], 800);
    assert_eq!(booking["commission"], 80);
    assert_eq!(booking["status"], "pending");
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, updated) = app.call("PUT", &format!("/api/v1/services/{}", service_id), Some(&admin), Some(json!({
        "base_price": 950
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["base_price"], 950);

    let (status, fetched) = app.call("GET", &format!("/api/v1/bookings/{}", booking_id), Some(&client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["total_price"], 800);

    let (_, later) = app.call("POST", "/api/v1/bookings", Some(&client), Some(json!({
        "service_id": service_id,
        "date": far_date().format("%Y-%m-%d").to_string(),
        "time": "11:00:00",
        "address": "5 Rada St",
        "city": "Makati"
    }))).await;
    assert_eq!(later["total_price"], 950);
}

#[tokio::test]
async fn test_catalogue_writes_are_admin_only() {
    let app = TestApp::new().await;
    let client = app.token("client-1", "client");

    let (status, body) = app.call("POST", "/api/v1/services", Some(&client), Some(json!({
        "name": "Nope", "category": "plumbing", "base_price": 100, "estimated_duration_min": 30
    }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_authorized");
}

#[tokio::test]
async fn test_catalogue_price_is_bounded() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "admin");

    let (status, body) = app.call("POST", "/api/v1/services", Some(&admin), Some(json!({
        "name": "Gold plated", "category": "plumbing", "base_price": 10_000_000_000_000_000_i64, "estimated_duration_min": 30
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, body) = app.call("POST", "/api/v1/services", Some(&admin), Some(json!({
        "name": "Refund", "category": "plumbing", "base_price": -1, "estimated_duration_min": 30
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, _) = app.call("POST", "/api/v1/services", Some(&admin), Some(json!({
        "name": "Premium", "category": "plumbing", "base_price": 1_000_000_000_000_i64, "estimated_duration_min": 30
    }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_dispatch_flow_over_http() {
    let app = TestApp::new().await;
    let service = app.seed_service("plumbing", 1000).await;
    app.seed_technician("tech-a", &["Makati"], &["plumbing"], 4.7).await;
    app.seed_technician("tech-b", &["Makati"], &["plumbing"], 4.1).await;
    let booking = app.book("client-1", &service, far_date(), "Makati").await;

    let admin = app.token("admin-1", "admin");
    let tech_a = app.token("tech-a", "technician");
    let tech_b = app.token("tech-b", "technician");
    let client = app.token("client-1", "client");

    let (status, eligible) = app.call("GET", &format!("/api/v1/bookings/{}/eligible", booking.id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(eligible[0]["id"], "tech-a");
    assert_eq!(eligible.as_array().unwrap().len(), 2);

    let (status, _) = app.call("GET", &format!("/api/v1/bookings/{}/eligible", booking.id), Some(&client), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, assigned) = app.call("POST", &format!("/api/v1/bookings/{}/assign", booking.id), Some(&admin), Some(json!({
        "technician_id": "tech-a"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["status"], "assigned");

    let (status, body) = app.call("POST", &format!("/api/v1/bookings/{}/assign", booking.id), Some(&admin), Some(json!({
        "technician_id": "tech-b"
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_assigned");

    let (status, body) = app.call("POST", &format!("/api/v1/bookings/{}/transition", booking.id), Some(&tech_b), Some(json!({
        "status": "in_progress"
    }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_authorized");

    let (status, _) = app.call("POST", &format!("/api/v1/bookings/{}/transition", booking.id), Some(&tech_a), Some(json!({
        "status": "in_progress"
    }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call("POST", &format!("/api/v1/bookings/{}/cancel", booking.id), Some(&client), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_state");

    let (status, done) = app.call("POST", &format!("/api/v1/bookings/{}/transition", booking.id), Some(&tech_a), Some(json!({
        "status": "completed"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (status, tech) = app.call("GET", "/api/v1/technicians/tech-a", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tech["earnings"], 900);
    assert_eq!(tech["completed_jobs"], 1);

    let (status, list) = app.call("GET", "/api/v1/bookings", Some(&tech_a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (_, list) = app.call("GET", "/api/v1/bookings", Some(&tech_b), None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_transition_endpoint_routes_cancel_through_window() {
    let app = TestApp::new().await;
    let service = app.seed_service("cleaning", 500).await;
    let soon = (chrono::Utc::now() + chrono::Duration::days(1)).date_naive();
    let booking = app.book("client-1", &service, soon, "Makati").await;
    let client = app.token("client-1", "client");

    let (status, body) = app.call("POST", &format!("/api/v1/bookings/{}/transition", booking.id), Some(&client), Some(json!({
        "status": "cancelled"
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "cancellation_window_closed");
    assert_eq!(app.booking(&booking.id).await.status.as_str(), "pending");
}

#[tokio::test]
async fn test_reschedule_validates_input() {
    let app = TestApp::new().await;
    let service = app.seed_service("cleaning", 500).await;
    let booking = app.book("client-1", &service, far_date(), "Makati").await;
    let client = app.token("client-1", "client");

    let (status, body) = app.call("POST", &format!("/api/v1/bookings/{}/reschedule", booking.id), Some(&client), Some(json!({
        "date": "next tuesday", "time": "10:00"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let new_date = (far_date() + chrono::Duration::days(3)).format("%Y-%m-%d").to_string();
    let (status, moved) = app.call("POST", &format!("/api/v1/bookings/{}/reschedule", booking.id), Some(&client), Some(json!({
        "date": new_date, "time": "15:00"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["scheduled_date"], new_date);
    assert_eq!(moved["scheduled_time"], "15:00:00");
}

#[tokio::test]
async fn test_clients_only_see_their_own_bookings() {
    let app = TestApp::new().await;
    let service = app.seed_service("cleaning", 500).await;
    let mine = app.book("client-1", &service, far_date(), "Makati").await;
    app.book("client-2", &service, far_date(), "Makati").await;

    let client = app.token("client-1", "client");
    let other = app.token("client-2", "client");

    let (_, list) = app.call("GET", "/api/v1/bookings", Some(&client), None).await;
    let ids: Vec<&str> = list.as_array().unwrap().iter().map(|b| b["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![mine.id.as_str()]);

    let (status, _) = app.call("GET", &format!("/api/v1/bookings/{}", mine.id), Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call("GET", "/api/v1/bookings/does-not-exist", Some(&client), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "booking_not_found");
}

#[tokio::test]
async fn test_technician_onboarding_and_availability() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "admin");
    let tech = app.token("tech-new", "technician");
    let other_tech = app.token("tech-other", "technician");

    let (status, created) = app.call("POST", "/api/v1/technicians", Some(&admin), Some(json!({
        "id": "tech-new",
        "display_name": "Ana",
        "skills": ["plumbing"],
        "service_areas": ["Makati"],
        "rating": 4.4
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["is_verified"], false);
    assert_eq!(created["availability_status"], "available");

    let (status, verified) = app.call("PUT", "/api/v1/technicians/tech-new", Some(&admin), Some(json!({
        "is_verified": true
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["is_verified"], true);

    let (status, _) = app.call("PUT", "/api/v1/technicians/tech-new/availability", Some(&other_tech), Some(json!({
        "status": "offline"
    }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app.call("PUT", "/api/v1/technicians/tech-new/availability", Some(&tech), Some(json!({
        "status": "busy"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["availability_status"], "busy");
}

#[tokio::test]
async fn test_admin_stats_counts_every_status() {
    let app = TestApp::new().await;
    let service = app.seed_service("cleaning", 500).await;
    app.seed_technician("tech-a", &["Makati"], &["cleaning"], 4.5).await;
    let first = app.book("client-1", &service, far_date(), "Makati").await;
    app.book("client-1", &service, far_date(), "Makati").await;

    let admin = app.token("admin-1", "admin");
    let (status, _) = app.call("POST", &format!("/api/v1/bookings/{}/auto-assign", first.id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, stats) = app.call("GET", "/api/v1/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["bookings"]["pending"], 1);
    assert_eq!(stats["bookings"]["assigned"], 1);
    assert_eq!(stats["bookings"]["completed"], 0);
    assert_eq!(stats["technicians"]["available"], 1);

    let client = app.token("client-1", "client");
    let (status, _) = app.call("GET", "/api/v1/admin/stats", Some(&client), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_commission_rate_must_be_a_fraction_of_the_price() {
    let app = TestApp::new().await;

    for bps in [12_000, -1] {
        let mut config = app.state.config.clone();
        config.platform_commission_bps = bps;
        let state = AppState::assemble(
            config,
            app.state.booking_repo.clone(),
            app.state.technician_repo.clone(),
            app.state.service_repo.clone(),
            app.state.outbox_repo.clone(),
            app.bridge.clone(),
        );
        assert!(matches!(state, Err(AppError::InternalWithMsg(_))), "bps {} accepted", bps);
    }

    let mut config = app.state.config.clone();
    config.platform_commission_bps = 10_000;
    let state = AppState::assemble(
        config,
        app.state.booking_repo.clone(),
        app.state.technician_repo.clone(),
        app.state.service_repo.clone(),
        app.state.outbox_repo.clone(),
        app.bridge.clone(),
    );
    assert!(state.is_ok());
}
