#![allow(dead_code)]

use dispatch_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::repositories::{
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_technician_repo::SqliteTechnicianRepo,
        sqlite_service_repo::SqliteServiceRepo,
        sqlite_outbox_repo::SqliteOutboxRepo,
    },
    domain::models::{
        actor::AuthContext,
        auth::Claims,
        booking::{Booking, BookingStatus},
        lifecycle::{DomainEvent, LifecycleEvent},
        service::Service,
        technician::{NewTechnicianParams, Technician},
    },
    domain::ports::{BookingRepository, NotificationBridge},
    domain::services::booking_service::CreateBooking,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::time::sleep;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;
use serde_json::Value;

pub fn booking_input(service: &Service, date: NaiveDate, city: &str) -> CreateBooking {
    CreateBooking {
        client_id: None,
        service_id: service.id.clone(),
        scheduled_date: date,
        scheduled_time: nine_am(),
        address: "12 Ayala Avenue".to_string(),
        city: city.to_string(),
        coordinates: None,
        notes: None,
    }
}

pub const TEST_ISSUER: &str = "test-issuer";

/// Captures every published event in order. Optionally stalls before
/// recording a lifecycle event into one status.
#[derive(Default)]
pub struct RecordingBridge {
    events: Mutex<Vec<DomainEvent>>,
    stall: Option<(BookingStatus, Duration)>,
}

impl RecordingBridge {
    pub fn stalling_on(status: BookingStatus, delay: Duration) -> Self {
        Self { events: Mutex::default(), stall: Some((status, delay)) }
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn lifecycle_for(&self, booking_id: &str) -> Vec<LifecycleEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DomainEvent::Lifecycle(l) if l.booking_id == booking_id => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn for_booking(&self, booking_id: &str) -> Vec<DomainEvent> {
        self.events().into_iter().filter(|e| e.booking_id() == booking_id).collect()
    }
}

#[async_trait]
impl NotificationBridge for RecordingBridge {
    async fn publish(&self, event: DomainEvent) {
        if let (Some((status, delay)), DomainEvent::Lifecycle(l)) = (self.stall, &event) {
            if l.to_status == status {
                sleep(delay).await;
            }
        }
        self.events.lock().unwrap().push(event);
    }
}

/// SQLite booking storage with injectable latency: reads wait before
/// querying, guarded writes commit first and acknowledge late.
pub struct LaggingBookingRepo {
    inner: SqliteBookingRepo,
    read_delay: Duration,
    ack_delay: Duration,
}

impl LaggingBookingRepo {
    async fn before_read(&self) {
        if !self.read_delay.is_zero() {
            sleep(self.read_delay).await;
        }
    }

    async fn ack<T>(&self, written: Result<T, AppError>) -> Result<T, AppError> {
        if !self.ack_delay.is_zero() {
            sleep(self.ack_delay).await;
        }
        written
    }
}

#[async_trait]
impl BookingRepository for LaggingBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        self.inner.create(booking).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        self.before_read().await;
        self.inner.find_by_id(id).await
    }

    async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError> {
        self.inner.list_by_client(client_id).await
    }

    async fn list_by_technician(&self, technician_id: &str) -> Result<Vec<Booking>, AppError> {
        self.inner.list_by_technician(technician_id).await
    }

    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        self.inner.list_all().await
    }

    async fn update_status(&self, id: &str, from: BookingStatus, to: BookingStatus, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let written = self.inner.update_status(id, from, to, at).await;
        self.ack(written).await
    }

    async fn complete(&self, id: &str, technician_id: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let written = self.inner.complete(id, technician_id, at).await;
        self.ack(written).await
    }

    async fn claim_technician(&self, id: &str, technician_id: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let written = self.inner.claim_technician(id, technician_id, at).await;
        self.ack(written).await
    }

    async fn swap_technician(&self, id: &str, previous: &str, next: &str, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let written = self.inner.swap_technician(id, previous, next, at).await;
        self.ack(written).await
    }

    async fn cancel(&self, id: &str, from: BookingStatus, bound: Option<&str>, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let written = self.inner.cancel(id, from, bound, at).await;
        self.ack(written).await
    }

    async fn reschedule(&self, id: &str, from: BookingStatus, date: NaiveDate, time: NaiveTime, at: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let written = self.inner.reschedule(id, from, date, time, at).await;
        self.ack(written).await
    }

    async fn count_by_status(&self) -> Result<Vec<(BookingStatus, i64)>, AppError> {
        self.inner.count_by_status().await
    }
}

/// Knobs for a `TestApp`. Defaults match production-like timings.
#[derive(Default)]
pub struct TestOptions {
    pub operation_timeout_ms: Option<u64>,
    pub read_delay: Duration,
    pub ack_delay: Duration,
    pub stall_event: Option<(BookingStatus, Duration)>,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub bridge: Arc<RecordingBridge>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: TEST_ISSUER.to_string(),
            service_timezone: "UTC".to_string(),
            cancellation_window_days: 3,
            operation_timeout_ms: options.operation_timeout_ms.unwrap_or(5_000),
            platform_commission_bps: 1_000,
            notification_webhook_url: None,
            notification_webhook_token: None,
            outbox_max_attempts: 3,
        };

        let bridge = Arc::new(match options.stall_event {
            Some((status, delay)) => RecordingBridge::stalling_on(status, delay),
            None => RecordingBridge::default(),
        });
        let booking_repo = LaggingBookingRepo {
            inner: SqliteBookingRepo::new(pool.clone()),
            read_delay: options.read_delay,
            ack_delay: options.ack_delay,
        };

        let state = Arc::new(AppState::assemble(
            config,
            Arc::new(booking_repo),
            Arc::new(SqliteTechnicianRepo::new(pool.clone())),
            Arc::new(SqliteServiceRepo::new(pool.clone())),
            Arc::new(SqliteOutboxRepo::new(pool.clone())),
            bridge.clone(),
        ).expect("Failed to assemble state"));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            bridge,
        }
    }

    pub fn token(&self, user_id: &str, role: &str) -> String {
        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            iss: TEST_ISSUER.to_string(),
            sub: user_id.to_string(),
            aud: "dispatch-api".to_string(),
            exp: now + 3600,
            iat: now,
            role: role.to_string(),
        };
        let key = EncodingKey::from_ed_pem(priv_key_pem.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::EdDSA), &claims, &key).unwrap()
    }

    /// Sends a request with an optional Bearer token and JSON body.
    pub async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }

    pub async fn seed_service(&self, category: &str, base_price: i64) -> Service {
        let service = Service::new(format!("{} service", category), category.to_string(), base_price, 90);
        self.state.service_repo.create(&service).await.unwrap()
    }

    pub async fn seed_technician(&self, id: &str, areas: &[&str], skills: &[&str], rating: f64) -> Technician {
        let technician = Technician::new(NewTechnicianParams {
            id: Some(id.to_string()),
            display_name: format!("Tech {}", id),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            service_areas: areas.iter().map(|s| s.to_string()).collect(),
            rating,
            is_verified: true,
        });
        self.state.technician_repo.create(&technician).await.unwrap()
    }

    pub async fn book(&self, client_id: &str, service: &Service, date: NaiveDate, city: &str) -> Booking {
        let input = booking_input(service, date, city);
        self.state.booking_service.create(&AuthContext::client(client_id), input).await.unwrap()
    }

    pub async fn booking(&self, booking_id: &str) -> Booking {
        self.state.booking_repo.find_by_id(booking_id).await.unwrap().unwrap()
    }

    pub async fn technician(&self, technician_id: &str) -> Technician {
        self.state.technician_repo.find_by_id(technician_id).await.unwrap().unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub fn nine_am() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

/// A date comfortably beyond any cancellation window.
pub fn far_date() -> NaiveDate {
    (Utc::now() + chrono::Duration::days(30)).date_naive()
}

/// 09:00 UTC on `date`, minus `days`.
pub fn days_before(date: NaiveDate, days: i64) -> DateTime<Utc> {
    date.and_time(nine_am()).and_utc() - chrono::Duration::days(days)
}
