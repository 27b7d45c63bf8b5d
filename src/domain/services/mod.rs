pub mod access;
pub mod booking_service;
pub mod dispatch;
pub mod locks;
pub mod schedule_guard;
pub mod skills;
pub mod state_machine;
