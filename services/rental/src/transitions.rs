//! Booking status transition policy
//!
//! The state machine is a table of allowed (current, requested) pairs per
//! actor role; anything absent is denied. Terminal statuses have no rows, so
//! nothing leaves them, not even a transition to the same value.

use crate::error::{RentalError, RentalResult};
use crate::models::BookingStatus;

use BookingStatus::{Cancelled, Completed, Confirmed, Declined, Pending};

/// Who is driving the transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionActor {
    /// The user who owns the booking
    Owner,
    /// An administrator
    Admin,
}

/// Transitions the owning user may drive: cancellation only
const OWNER_ALLOWED: &[(BookingStatus, BookingStatus)] =
    &[(Pending, Cancelled), (Confirmed, Cancelled)];

/// Transitions an administrator may drive; forward-only with respect to the
/// pending stage (confirmed never returns to pending)
const ADMIN_ALLOWED: &[(BookingStatus, BookingStatus)] = &[
    (Pending, Confirmed),
    (Pending, Declined),
    (Pending, Cancelled),
    (Confirmed, Cancelled),
    (Confirmed, Completed),
];

/// Check a requested transition against the policy table
pub fn authorize(
    actor: TransitionActor,
    current: BookingStatus,
    requested: BookingStatus,
) -> RentalResult<()> {
    let table = match actor {
        TransitionActor::Owner => OWNER_ALLOWED,
        TransitionActor::Admin => ADMIN_ALLOWED,
    };

    if table.contains(&(current, requested)) {
        return Ok(());
    }

    Err(denial(actor, current, requested))
}

fn denial(
    actor: TransitionActor,
    current: BookingStatus,
    requested: BookingStatus,
) -> RentalError {
    if actor == TransitionActor::Owner {
        return RentalError::State(format!(
            "Booking cannot be cancelled as it is already '{}'",
            current
        ));
    }

    if current.is_terminal() {
        return RentalError::State(format!(
            "Cannot change status of a booking that is already '{}'",
            current
        ));
    }

    if current == Confirmed && requested == Pending {
        return RentalError::State(
            "Cannot change status from 'confirmed' back to 'pending'; use 'declined' or 'cancelled' instead"
                .to_string(),
        );
    }

    RentalError::State(format!(
        "Cannot change status from '{}' to '{}'",
        current, requested
    ))
}
