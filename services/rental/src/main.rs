use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod availability;
mod engine;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod transitions;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};

use crate::engine::BookingEngine;
use crate::middleware::JwtVerifier;
use crate::repositories::{BookingRepository, CarRepository, UserRepository};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting rental service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, std::path::Path::new("migrations")).await?;

    let jwt_verifier = JwtVerifier::from_env()?;

    // Initialize repositories and the booking engine
    let car_repository = CarRepository::new(pool.clone());
    let booking_engine = BookingEngine::new(
        BookingRepository::new(pool.clone()),
        car_repository.clone(),
        UserRepository::new(pool.clone()),
    );

    info!("Rental service initialized successfully");

    let app_state = AppState {
        db_pool: pool,
        booking_engine,
        car_repository,
        jwt_verifier,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
    info!("Rental service listening on 0.0.0.0:3001");

    axum::serve(listener, app).await?;

    Ok(())
}
