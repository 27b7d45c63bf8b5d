use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_public_key: String, // Ed25519 public key (PEM)
    pub auth_issuer: String,
    pub service_timezone: String,
    pub cancellation_window_days: i64,
    pub operation_timeout_ms: u64,
    pub platform_commission_bps: i64,
    pub notification_webhook_url: Option<String>,
    pub notification_webhook_token: Option<String>,
    pub outbox_max_attempts: i32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://identity.dispatch.local".to_string()),
            service_timezone: env::var("SERVICE_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            cancellation_window_days: parse_or("CANCELLATION_WINDOW_DAYS", 3),
            operation_timeout_ms: parse_or("OPERATION_TIMEOUT_MS", 5_000),
            platform_commission_bps: parse_or("PLATFORM_COMMISSION_BPS", 1_000),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
            notification_webhook_token: env::var("NOTIFICATION_WEBHOOK_TOKEN").ok().filter(|v| !v.is_empty()),
            outbox_max_attempts: parse_or("OUTBOX_MAX_ATTEMPTS", 8),
        }
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| panic!("{} must be a number", key)),
        Err(_) => default,
    }
}
