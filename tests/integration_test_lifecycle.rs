mod common;

use common::{far_date, TestApp};
use dispatch_backend::domain::models::{actor::AuthContext, booking::BookingStatus};
use dispatch_backend::error::AppError;

#[tokio::test]
async fn test_full_lifecycle_credits_technician() {
    let app = TestApp::new().await;
    let service = app.seed_service("plumbing", 800).await;
    app.seed_technician("tech-a", &["Makati"], &["plumbing"], 4.5).await;
    let booking = app.book("client-1", &service, far_date(), "Makati").await;

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.commission, Some(80));

    let admin = AuthContext::admin("admin-1");
    let tech = AuthContext::technician("tech-a");

    let assigned = app.state.dispatch.assign(&booking.id, "tech-a", &admin).await.unwrap();
    assert_eq!(assigned.status, BookingStatus::Assigned);
    assert_eq!(assigned.technician_id.as_deref(), Some("tech-a"));
    assert_eq!(app.technician("tech-a").await.active_jobs, 1);

    app.state.state_machine.transition(&booking.id, BookingStatus::InProgress, &tech).await.unwrap();
    let done = app.state.state_machine.transition(&booking.id, BookingStatus::Completed, &tech).await.unwrap();
    assert_eq!(done.status, BookingStatus::Completed);
    assert_eq!(done.technician_id.as_deref(), Some("tech-a"));

    let t = app.technician("tech-a").await;
    assert_eq!(t.total_jobs, 1);
    assert_eq!(t.completed_jobs, 1);
    assert_eq!(t.earnings, 720);
    assert_eq!(t.active_jobs, 0);

    let history: Vec<(BookingStatus, BookingStatus)> = app.bridge.lifecycle_for(&booking.id)
        .iter()
        .map(|e| (e.from_status, e.to_status))
        .collect();
    assert_eq!(history, vec![
        (BookingStatus::Pending, BookingStatus::Confirmed),
        (BookingStatus::Confirmed, BookingStatus::Assigned),
        (BookingStatus::Assigned, BookingStatus::InProgress),
        (BookingStatus::InProgress, BookingStatus::Completed),
    ]);
}

#[tokio::test]
async fn test_wrong_technician_cannot_start_job() {
    let app = TestApp::new().await;
    let service = app.seed_service("plumbing", 800).await;
    app.seed_technician("tech-a", &["Makati"], &["plumbing"], 4.5).await;
    app.seed_technician("tech-b", &["Makati"], &["plumbing"], 4.0).await;
    let booking = app.book("client-1", &service, far_date(), "Makati").await;

    app.state.dispatch.assign(&booking.id, "tech-a", &AuthContext::admin("admin-1")).await.unwrap();
    let events_before = app.bridge.events().len();

    let err = app.state.state_machine
        .transition(&booking.id, BookingStatus::InProgress, &AuthContext::technician("tech-b"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAuthorized(_)));

    let after = app.booking(&booking.id).await;
    assert_eq!(after.status, BookingStatus::Assigned);
    assert_eq!(after.technician_id.as_deref(), Some("tech-a"));
    assert_eq!(app.bridge.events().len(), events_before);
}

#[tokio::test]
async fn test_completion_cannot_skip_steps() {
    let app = TestApp::new().await;
    let service = app.seed_service("plumbing", 800).await;
    let booking = app.book("client-1", &service, far_date(), "Makati").await;

    let err = app.state.state_machine
        .transition(&booking.id, BookingStatus::Completed, &AuthContext::technician("tech-a"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { from: BookingStatus::Pending, to: BookingStatus::Completed }));

    let err = app.state.state_machine
        .transition(&booking.id, BookingStatus::InProgress, &AuthContext::admin("admin-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    assert_eq!(app.booking(&booking.id).await.status, BookingStatus::Pending);
    assert!(app.bridge.for_booking(&booking.id).is_empty());
}

#[tokio::test]
async fn test_confirm_is_admin_only() {
    let app = TestApp::new().await;
    let service = app.seed_service("cleaning", 500).await;
    let booking = app.book("client-1", &service, far_date(), "Makati").await;

    let err = app.state.state_machine
        .transition(&booking.id, BookingStatus::Confirmed, &AuthContext::client("client-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAuthorized(_)));

    let confirmed = app.state.state_machine
        .transition(&booking.id, BookingStatus::Confirmed, &AuthContext::admin("admin-1"))
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(confirmed.updated_at >= booking.updated_at);
    assert_eq!(app.bridge.lifecycle_for(&booking.id).len(), 1);
}

#[tokio::test]
async fn test_generic_transition_refuses_assign_and_cancel_edges() {
    let app = TestApp::new().await;
    let service = app.seed_service("cleaning", 500).await;
    let booking = app.book("client-1", &service, far_date(), "Makati").await;
    let admin = AuthContext::admin("admin-1");

    app.state.state_machine.transition(&booking.id, BookingStatus::Confirmed, &admin).await.unwrap();

    let err = app.state.state_machine.transition(&booking.id, BookingStatus::Assigned, &admin).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = app.state.state_machine.transition(&booking.id, BookingStatus::Cancelled, &admin).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(app.booking(&booking.id).await.status, BookingStatus::Confirmed);
    assert_eq!(app.bridge.lifecycle_for(&booking.id).len(), 1);
}

#[tokio::test]
async fn test_terminal_booking_rejects_everything() {
    let app = TestApp::new().await;
    let service = app.seed_service("cleaning", 500).await;
    let booking = app.book("client-1", &service, far_date(), "Makati").await;
    let admin = AuthContext::admin("admin-1");

    app.state.schedule_guard.cancel(&booking.id, &admin).await.unwrap();

    for target in BookingStatus::ALL {
        let err = app.state.state_machine.transition(&booking.id, target, &admin).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { from: BookingStatus::Cancelled, .. }));
    }

    let err = app.state.schedule_guard.cancel(&booking.id, &admin).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(BookingStatus::Cancelled)));
}

#[tokio::test]
async fn test_unknown_booking_is_reported() {
    let app = TestApp::new().await;
    let err = app.state.state_machine
        .transition("missing", BookingStatus::Confirmed, &AuthContext::admin("admin-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BookingNotFound(_)));
}

#[tokio::test]
async fn test_unbookable_price_is_rejected_without_panicking() {
    let app = TestApp::new().await;
    // Seeded straight into storage, past the catalogue's own price check.
    let service = app.seed_service("plumbing", 10_000_000_000_000_000).await;

    let err = app.state.booking_service
        .create(&AuthContext::client("client-1"), common::booking_input(&service, far_date(), "Makati"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(app.state.booking_repo.list_all().await.unwrap().is_empty());
    assert!(app.bridge.events().is_empty());
}
