use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::background::RetryPolicy;
use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{
    BookingRepository, EventSink, NotificationBridge, OutboxRepository, ServiceRepository, TechnicianRepository,
};
use crate::infra::notifications::{
    log_bridge::LogBridge,
    outbox_bridge::OutboxBridge,
    webhook_sink::WebhookSink,
};
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_technician_repo::PostgresTechnicianRepo,
    postgres_service_repo::PostgresServiceRepo, postgres_outbox_repo::PostgresOutboxRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_technician_repo::SqliteTechnicianRepo,
    sqlite_service_repo::SqliteServiceRepo, sqlite_outbox_repo::SqliteOutboxRepo,
};

/// Everything the server needs: request state plus the relay's collaborators.
pub struct Bootstrap {
    pub state: AppState,
    /// Present when a webhook is configured; the outbox relay only runs then.
    pub sink: Option<Arc<dyn EventSink>>,
    pub retry: RetryPolicy,
}

struct Repos {
    booking: Arc<dyn BookingRepository>,
    technician: Arc<dyn TechnicianRepository>,
    service: Arc<dyn ServiceRepository>,
    outbox: Arc<dyn OutboxRepository>,
}

pub async fn bootstrap_state(config: &Config) -> Bootstrap {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        Repos {
            booking: Arc::new(PostgresBookingRepo::new(pool.clone())),
            technician: Arc::new(PostgresTechnicianRepo::new(pool.clone())),
            service: Arc::new(PostgresServiceRepo::new(pool.clone())),
            outbox: Arc::new(PostgresOutboxRepo::new(pool.clone())),
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        Repos {
            booking: Arc::new(SqliteBookingRepo::new(pool.clone())),
            technician: Arc::new(SqliteTechnicianRepo::new(pool.clone())),
            service: Arc::new(SqliteServiceRepo::new(pool.clone())),
            outbox: Arc::new(SqliteOutboxRepo::new(pool.clone())),
        }
    };

    let (bridge, sink): (Arc<dyn NotificationBridge>, Option<Arc<dyn EventSink>>) = match &config.notification_webhook_url {
        Some(url) => {
            info!("Relaying booking events to {}", url);
            let sink: Arc<dyn EventSink> = Arc::new(WebhookSink::new(url.clone(), config.notification_webhook_token.clone()));
            (Arc::new(OutboxBridge::new(repos.outbox.clone())), Some(sink))
        }
        None => {
            info!("NOTIFICATION_WEBHOOK_URL not set; booking events are logged only");
            (Arc::new(LogBridge), None)
        }
    };

    let state = AppState::assemble(
        config.clone(),
        repos.booking,
        repos.technician,
        repos.service,
        repos.outbox,
        bridge,
    )
    .expect("Invalid service configuration");

    Bootstrap {
        state,
        sink,
        retry: RetryPolicy::new(config.outbox_max_attempts),
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
