//! Rental service models

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub mod booking;
pub mod car;

// Re-export for convenience
pub use booking::{
    Booking, BookingCounts, BookingListQuery, BookingListResponse, BookingStatus, BookingView,
    CarCounts, CreateBookingRequest, DashboardStats, Pagination, Revenue,
    SetBookingStatusRequest, UserCounts, UserSummary,
};
pub use car::{Car, CarFilter, CarForm, CarStatus, CarSummary};

/// Role of an authenticated actor, carried in the JWT `role` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Authenticated actor, passed explicitly into every booking-engine operation
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}
