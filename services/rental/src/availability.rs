//! Date-range availability rules
//!
//! Booking intervals are half-open: [start_date, end_date). A booking ending
//! on day D and one starting on day D do not conflict.

use chrono::NaiveDate;

use crate::error::{RentalError, RentalResult};
use crate::models::BookingStatus;

/// Statuses that count toward conflict detection
pub const ACTIVE_STATUSES: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

/// Whether two half-open date ranges intersect
pub fn overlaps(
    existing_start: NaiveDate,
    existing_end: NaiveDate,
    requested_start: NaiveDate,
    requested_end: NaiveDate,
) -> bool {
    existing_start < requested_end && existing_end > requested_start
}

/// Number of rental days covered by [start, end)
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Total price for the stay, frozen at creation time
pub fn quote_total(start: NaiveDate, end: NaiveDate, price_per_day: f64) -> f64 {
    rental_days(start, end) as f64 * price_per_day
}

/// Structural validation of a requested booking window
///
/// `today` is passed in rather than read from the clock so the rule is
/// checkable in isolation.
pub fn validate_dates(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> RentalResult<()> {
    if end <= start {
        return Err(RentalError::Validation(
            "End date must be after start date".to_string(),
        ));
    }

    if start < today {
        return Err(RentalError::Validation(
            "Start date cannot be in the past".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn overlapping_ranges_conflict() {
        // existing 10..12, requested 11..13
        assert!(overlaps(d(2024, 5, 10), d(2024, 5, 12), d(2024, 5, 11), d(2024, 5, 13)));
        // requested fully inside existing
        assert!(overlaps(d(2024, 5, 10), d(2024, 5, 20), d(2024, 5, 12), d(2024, 5, 14)));
        // requested encloses existing
        assert!(overlaps(d(2024, 5, 12), d(2024, 5, 14), d(2024, 5, 10), d(2024, 5, 20)));
        // identical ranges
        assert!(overlaps(d(2024, 5, 10), d(2024, 5, 12), d(2024, 5, 10), d(2024, 5, 12)));
    }

    #[test]
    fn adjacent_ranges_do_not_conflict() {
        // existing ends on the day the request starts: half-open, no overlap
        assert!(!overlaps(d(2024, 5, 10), d(2024, 5, 12), d(2024, 5, 12), d(2024, 5, 14)));
        assert!(!overlaps(d(2024, 5, 12), d(2024, 5, 14), d(2024, 5, 10), d(2024, 5, 12)));
    }

    #[test]
    fn disjoint_ranges_do_not_conflict() {
        assert!(!overlaps(d(2024, 5, 1), d(2024, 5, 3), d(2024, 5, 10), d(2024, 5, 12)));
    }

    #[test]
    fn rental_days_counts_nights() {
        assert_eq!(rental_days(d(2024, 5, 10), d(2024, 5, 12)), 2);
        assert_eq!(rental_days(d(2024, 5, 10), d(2024, 5, 11)), 1);
        // across a month boundary
        assert_eq!(rental_days(d(2024, 5, 30), d(2024, 6, 2)), 3);
    }

    #[test]
    fn quote_multiplies_days_by_daily_price() {
        assert_eq!(quote_total(d(2024, 5, 10), d(2024, 5, 12), 60.0), 120.0);
        assert_eq!(quote_total(d(2024, 5, 10), d(2024, 5, 13), 45.5), 136.5);
    }

    #[test]
    fn rejects_inverted_or_empty_windows() {
        let today = d(2024, 5, 1);
        assert!(matches!(
            validate_dates(d(2024, 5, 12), d(2024, 5, 10), today),
            Err(RentalError::Validation(_))
        ));
        assert!(matches!(
            validate_dates(d(2024, 5, 10), d(2024, 5, 10), today),
            Err(RentalError::Validation(_))
        ));
    }

    #[test]
    fn rejects_start_in_the_past() {
        let today = d(2024, 5, 11);
        assert!(matches!(
            validate_dates(d(2024, 5, 10), d(2024, 5, 12), today),
            Err(RentalError::Validation(_))
        ));
    }

    #[test]
    fn accepts_start_today_or_later() {
        let today = d(2024, 5, 10);
        assert!(validate_dates(d(2024, 5, 10), d(2024, 5, 12), today).is_ok());
        assert!(validate_dates(d(2024, 6, 1), d(2024, 6, 3), today).is_ok());
    }
}
