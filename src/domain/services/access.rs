use crate::domain::models::{
    actor::{AuthContext, Role},
    booking::{Booking, BookingStatus},
};
use crate::error::AppError;

/// Something an actor asks to do. Booking-scoped actions carry the booking
/// so ownership and binding can be checked.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    Move(&'a Booking, BookingStatus),
    Reschedule(&'a Booking),
    View(&'a Booking),
    Book,
    Dispatch,
    ManageCatalogue,
    ManageTechnicians,
    SetAvailability { technician_id: &'a str },
    ViewOperations,
}

impl Action<'_> {
    fn describe(&self) -> String {
        match self {
            Action::Move(booking, to) => format!("move booking {} to {}", booking.id, to),
            Action::Reschedule(booking) => format!("reschedule booking {}", booking.id),
            Action::View(booking) => format!("view booking {}", booking.id),
            Action::Book => "create bookings".to_string(),
            Action::Dispatch => "dispatch technicians".to_string(),
            Action::ManageCatalogue => "manage the service catalogue".to_string(),
            Action::ManageTechnicians => "manage technician profiles".to_string(),
            Action::SetAvailability { technician_id } => format!("change availability of {}", technician_id),
            Action::ViewOperations => "view operations data".to_string(),
        }
    }
}

fn owns(booking: &Booking, actor: &AuthContext) -> bool {
    booking.client_id == actor.user_id
}

fn bound_to(booking: &Booking, actor: &AuthContext) -> bool {
    booking.technician_id.as_deref() == Some(actor.user_id.as_str())
}

/// The permission table over `Role`.
pub fn permits(actor: &AuthContext, action: Action<'_>) -> bool {
    use BookingStatus::*;

    match (actor.role, action) {
        (Role::Admin, Action::Move(_, Confirmed | Assigned | Cancelled)) => true,
        (Role::Technician, Action::Move(booking, InProgress | Completed)) => bound_to(booking, actor),
        (Role::Client, Action::Move(booking, Cancelled)) => owns(booking, actor),
        (_, Action::Move(..)) => false,

        (Role::Admin, Action::Reschedule(_)) => true,
        (Role::Client, Action::Reschedule(booking)) => owns(booking, actor),
        (Role::Technician, Action::Reschedule(_)) => false,

        (Role::Admin, Action::View(_)) => true,
        (Role::Client, Action::View(booking)) => owns(booking, actor),
        (Role::Technician, Action::View(booking)) => bound_to(booking, actor),

        (Role::Admin | Role::Client, Action::Book) => true,
        (Role::Technician, Action::SetAvailability { technician_id }) => technician_id == actor.user_id,

        (Role::Admin, _) => true,
        _ => false,
    }
}

pub fn authorize(actor: &AuthContext, action: Action<'_>) -> Result<(), AppError> {
    if permits(actor, action) {
        Ok(())
    } else {
        Err(AppError::NotAuthorized(format!(
            "{:?} {} may not {}",
            actor.role, actor.user_id, action.describe()
        )))
    }
}
