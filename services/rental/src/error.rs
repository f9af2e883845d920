//! Custom error types for the rental service
//!
//! The booking engine reports every rejected operation as exactly one of the
//! kinds below; unexpected store failures travel separately as `Database`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Custom error type for the rental service
#[derive(Error, Debug)]
pub enum RentalError {
    /// Malformed or missing input; the caller can correct and resubmit
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// Requested interval overlaps an existing active booking for the car
    #[error("car {car_id} is already booked between {start} and {end}")]
    Conflict {
        car_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Requested status transition (or car-status gate) is not permitted
    #[error("{0}")]
    State(String),

    /// Actor lacks permission for the requested mutation
    #[error("{0}")]
    Authorization(String),

    /// Missing or invalid credentials at the HTTP boundary; never produced
    /// by the booking engine itself
    #[error("authentication required")]
    Unauthenticated,

    /// Opaque infrastructure failure; never retried here
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Type alias for rental results
pub type RentalResult<T> = Result<T, RentalError>;

/// SQLSTATE code of a database-side error, if any
pub fn db_error_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.to_string()),
        _ => None,
    }
}

/// Exclusion constraint violation (overlapping ranges)
pub const SQLSTATE_EXCLUSION_VIOLATION: &str = "23P01";
/// Foreign key violation
pub const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";

impl IntoResponse for RentalError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            RentalError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RentalError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            RentalError::Conflict { .. } => (
                StatusCode::CONFLICT,
                "Car is already booked for the selected dates".to_string(),
            ),
            RentalError::State(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RentalError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            RentalError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Please log in to view this resource".to_string(),
            ),
            RentalError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn status_of(err: RentalError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn error_kinds_map_to_distinct_status_codes() {
        assert_eq!(
            status_of(RentalError::Validation("bad dates".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RentalError::NotFound {
                entity: "car",
                id: Uuid::nil()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RentalError::Conflict {
                car_id: Uuid::nil(),
                start: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RentalError::State("terminal".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RentalError::Authorization("not yours".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(RentalError::Unauthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(RentalError::Database(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let err = RentalError::NotFound {
            entity: "booking",
            id: Uuid::nil(),
        };
        assert!(err.to_string().starts_with("booking"));
    }
}
