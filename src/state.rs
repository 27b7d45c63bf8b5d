use std::sync::Arc;
use crate::domain::ports::{
    BookingRepository, TechnicianRepository, ServiceRepository, OutboxRepository, NotificationBridge,
};
use crate::domain::services::{
    booking_service::BookingService,
    dispatch::DispatchService,
    locks::BookingLocks,
    schedule_guard::{CancellationPolicy, ScheduleGuard},
    state_machine::StateMachine,
};
use crate::config::Config;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub technician_repo: Arc<dyn TechnicianRepository>,
    pub service_repo: Arc<dyn ServiceRepository>,
    pub outbox_repo: Arc<dyn OutboxRepository>,
    pub bridge: Arc<dyn NotificationBridge>,
    pub state_machine: Arc<StateMachine>,
    pub dispatch: Arc<DispatchService>,
    pub schedule_guard: Arc<ScheduleGuard>,
    pub booking_service: Arc<BookingService>,
}

impl AppState {
    /// Wires the booking core over the given storage and bridge.
    pub fn assemble(
        config: Config,
        booking_repo: Arc<dyn BookingRepository>,
        technician_repo: Arc<dyn TechnicianRepository>,
        service_repo: Arc<dyn ServiceRepository>,
        outbox_repo: Arc<dyn OutboxRepository>,
        bridge: Arc<dyn NotificationBridge>,
    ) -> Result<Self, AppError> {
        let tz = config.service_timezone.parse()
            .map_err(|_| AppError::InternalWithMsg(format!("Invalid SERVICE_TIMEZONE '{}'", config.service_timezone)))?;
        if !(0..=10_000).contains(&config.platform_commission_bps) {
            return Err(AppError::InternalWithMsg(format!(
                "PLATFORM_COMMISSION_BPS must be within 0..=10000, got {}", config.platform_commission_bps
            )));
        }
        let policy = CancellationPolicy::new(config.cancellation_window_days, tz);

        let state_machine = Arc::new(StateMachine::new(
            booking_repo.clone(),
            bridge.clone(),
            BookingLocks::new(),
            config.operation_timeout(),
        ));
        let dispatch = Arc::new(DispatchService::new(
            booking_repo.clone(),
            technician_repo.clone(),
            service_repo.clone(),
            state_machine.clone(),
        ));
        let schedule_guard = Arc::new(ScheduleGuard::new(booking_repo.clone(), state_machine.clone(), policy));
        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            service_repo.clone(),
            policy,
            config.platform_commission_bps,
        ));

        Ok(Self {
            config,
            booking_repo,
            technician_repo,
            service_repo,
            outbox_repo,
            bridge,
            state_machine,
            dispatch,
            schedule_guard,
            booking_service,
        })
    }
}
