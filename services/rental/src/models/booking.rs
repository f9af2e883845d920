//! Booking models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::car::CarSummary;

/// Booking lifecycle status, mapped to the `booking_status` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Declined => "declined",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Declined | BookingStatus::Cancelled | BookingStatus::Completed
        )
    }

    /// Active bookings count toward conflict detection
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Number of rental days covered by the half-open [start, end) range
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// Abbreviated user payload attached to booking responses
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Booking with user and car summaries joined in
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
    pub car: CarSummary,
}

/// Request for creating a booking
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Request for an admin booking status change
#[derive(Debug, Clone, Deserialize)]
pub struct SetBookingStatusRequest {
    pub status: BookingStatus,
}

/// Query parameters for the admin booking list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub user_id: Option<Uuid>,
    pub car_id: Option<Uuid>,
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
    /// Sort field
    pub sort_by: Option<String>,
    /// Sort order (asc or desc)
    pub order: Option<String>,
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_bookings: i64,
    pub limit: u32,
}

/// Response for the admin booking list
#[derive(Debug, Clone, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingView>,
    pub pagination: Pagination,
}

/// Booking counts broken down by status
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookingCounts {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub declined: i64,
    pub cancelled: i64,
    pub completed: i64,
}

/// User counts broken down by role
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserCounts {
    pub total: i64,
    pub admins: i64,
}

/// Car counts broken down by status
#[derive(Debug, Clone, Default, Serialize)]
pub struct CarCounts {
    pub total: i64,
    pub available: i64,
    pub booked: i64,
    pub maintenance: i64,
}

/// Revenue figures
#[derive(Debug, Clone, Default, Serialize)]
pub struct Revenue {
    pub total_completed_revenue: f64,
}

/// Point-in-time aggregate statistics for the admin dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub users: UserCounts,
    pub cars: CarCounts,
    pub bookings: BookingCounts,
    pub recent_bookings: Vec<BookingView>,
    pub revenue: Revenue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_active_partition_the_statuses() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::Declined.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
        assert!(!BookingStatus::Completed.is_active());

        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Declined.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::Pending).unwrap(),
            "\"pending\""
        );
        let parsed: BookingStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, BookingStatus::Completed);
    }

    #[test]
    fn duration_counts_calendar_days() {
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            car_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            total_price: 120.0,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        assert_eq!(booking.duration_days(), 2);
    }
}
