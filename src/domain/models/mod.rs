pub mod actor;
pub mod auth;
pub mod booking;
pub mod lifecycle;
pub mod outbox;
pub mod service;
pub mod technician;
