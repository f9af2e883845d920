//! Application state shared across handlers

use sqlx::PgPool;

use crate::engine::BookingEngine;
use crate::middleware::JwtVerifier;
use crate::repositories::CarRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub booking_engine: BookingEngine,
    pub car_repository: CarRepository,
    pub jwt_verifier: JwtVerifier,
}
