//! Car inventory models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::error::{RentalError, RentalResult};

/// Car availability flag, mapped to the `car_status` Postgres enum
///
/// This is an admin-set override; it is never derived from booking activity.
/// Real availability for a date range is always recomputed from active
/// bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "car_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    Available,
    Booked,
    Maintenance,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Booked => "booked",
            CarStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Car entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: f64,
    pub status: CarStatus,
    pub image_url: Option<String>,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Abbreviated car payload attached to booking responses
#[derive(Debug, Clone, Serialize)]
pub struct CarSummary {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: f64,
    pub image_url: Option<String>,
}

/// Payload for creating or updating a car
#[derive(Debug, Clone, Deserialize)]
pub struct CarForm {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: f64,
    pub status: Option<CarStatus>,
    pub image_url: Option<String>,
    pub features: Option<Vec<String>>,
}

impl CarForm {
    /// Structural validation against the current calendar year
    pub fn validate(&self, current_year: i32) -> RentalResult<()> {
        if self.make.trim().is_empty() {
            return Err(RentalError::Validation(
                "Please provide the car make".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(RentalError::Validation(
                "Please provide the car model".to_string(),
            ));
        }
        if self.year < 1900 {
            return Err(RentalError::Validation(
                "Year must be 1900 or later".to_string(),
            ));
        }
        if self.year > current_year + 1 {
            return Err(RentalError::Validation(format!(
                "Year cannot be more than {}",
                current_year + 1
            )));
        }
        if self.price_per_day < 0.0 {
            return Err(RentalError::Validation(
                "Price per day cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Filter predicates for car listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarFilter {
    /// Case-insensitive substring match on make or model
    pub search: Option<String>,
    /// Inclusive lower bound on price per day
    pub min_price: Option<f64>,
    /// Inclusive upper bound on price per day
    pub max_price: Option<f64>,
    /// Status equality
    pub status: Option<CarStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CarForm {
        CarForm {
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2023,
            price_per_day: 60.0,
            status: None,
            image_url: None,
            features: None,
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(form().validate(2024).is_ok());
    }

    #[test]
    fn next_year_is_allowed_but_not_beyond() {
        let mut f = form();
        f.year = 2025;
        assert!(f.validate(2024).is_ok());
        f.year = 2026;
        assert!(f.validate(2024).is_err());
    }

    #[test]
    fn rejects_pre_1900_years() {
        let mut f = form();
        f.year = 1899;
        assert!(f.validate(2024).is_err());
    }

    #[test]
    fn rejects_negative_price_and_blank_names() {
        let mut f = form();
        f.price_per_day = -1.0;
        assert!(f.validate(2024).is_err());

        let mut f = form();
        f.make = "  ".to_string();
        assert!(f.validate(2024).is_err());

        let mut f = form();
        f.model = String::new();
        assert!(f.validate(2024).is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CarStatus::Maintenance).unwrap(),
            "\"maintenance\""
        );
        let parsed: CarStatus = serde_json::from_str("\"available\"").unwrap();
        assert_eq!(parsed, CarStatus::Available);
    }
}
