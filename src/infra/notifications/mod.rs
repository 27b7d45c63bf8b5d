pub mod log_bridge;
pub mod outbox_bridge;
pub mod webhook_sink;
