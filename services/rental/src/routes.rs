//! Rental service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::{Datelike, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::RentalError,
    middleware::{admin_middleware, auth_middleware},
    models::{
        Actor, BookingListQuery, CarFilter, CarForm, CarStatus, CreateBookingRequest,
        SetBookingStatusRequest,
    },
    state::AppState,
};

/// Create the router for the rental service
pub fn create_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/mine", get(my_bookings))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/admin/cars", get(admin_list_cars).post(admin_create_car))
        .route(
            "/admin/cars/:id",
            get(admin_get_car).put(admin_update_car).delete(admin_delete_car),
        )
        .route("/admin/bookings", get(admin_list_bookings))
        .route("/admin/bookings/:id/status", patch(admin_set_booking_status))
        .route("/admin/dashboard", get(admin_dashboard))
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/cars", get(list_available_cars))
        .route("/cars/:id", get(car_details))
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "rental-service"
    }))
}

/// Public listing of available cars with search and price filters
pub async fn list_available_cars(
    State(state): State<AppState>,
    Query(mut filter): Query<CarFilter>,
) -> Result<impl IntoResponse, RentalError> {
    // The public surface only ever shows bookable inventory.
    filter.status = Some(CarStatus::Available);

    let cars = state.car_repository.list(&filter).await?;
    Ok(Json(json!({ "cars": cars })))
}

/// Public car detail
pub async fn car_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RentalError> {
    let car = state
        .car_repository
        .find_by_id(id)
        .await?
        .ok_or(RentalError::NotFound { entity: "car", id })?;

    Ok(Json(json!({ "car": car })))
}

/// Create a booking for the authenticated user
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, RentalError> {
    let booking = state.booking_engine.create_booking(&actor, &payload).await?;
    let view = state.booking_engine.booking_view(booking.id).await?;

    Ok((StatusCode::CREATED, Json(json!({ "booking": view }))))
}

/// List the authenticated user's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, RentalError> {
    let bookings = state.booking_engine.list_user_bookings(actor.id).await?;
    Ok(Json(json!({ "bookings": bookings })))
}

/// Cancel a booking owned by the authenticated user
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RentalError> {
    let booking = state.booking_engine.cancel_booking(id, &actor).await?;

    Ok(Json(json!({
        "booking_id": booking.id,
        "new_status": booking.status,
    })))
}

/// Admin: list every car regardless of status
pub async fn admin_list_cars(
    State(state): State<AppState>,
    Query(filter): Query<CarFilter>,
) -> Result<impl IntoResponse, RentalError> {
    let cars = state.car_repository.list(&filter).await?;
    Ok(Json(json!({ "cars": cars })))
}

/// Admin: car detail
pub async fn admin_get_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RentalError> {
    let car = state
        .car_repository
        .find_by_id(id)
        .await?
        .ok_or(RentalError::NotFound { entity: "car", id })?;

    Ok(Json(json!({ "car": car })))
}

/// Admin: add a car to the inventory
pub async fn admin_create_car(
    State(state): State<AppState>,
    Json(form): Json<CarForm>,
) -> Result<impl IntoResponse, RentalError> {
    form.validate(Utc::now().year())?;

    let car = state.car_repository.create(&form).await?;
    Ok((StatusCode::CREATED, Json(json!({ "car": car }))))
}

/// Admin: update a car
pub async fn admin_update_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<CarForm>,
) -> Result<impl IntoResponse, RentalError> {
    form.validate(Utc::now().year())?;

    let car = state.car_repository.update(id, &form).await?;
    Ok(Json(json!({ "car": car })))
}

/// Admin: delete a car
pub async fn admin_delete_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RentalError> {
    state.car_repository.delete(id).await?;
    Ok(Json(json!({ "message": "Car deleted successfully" })))
}

/// Admin: list bookings with filters, pagination, and sorting
pub async fn admin_list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, RentalError> {
    let response = state.booking_engine.list_all_bookings(&query).await?;
    Ok(Json(response))
}

/// Admin: change a booking's status
pub async fn admin_set_booking_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetBookingStatusRequest>,
) -> Result<impl IntoResponse, RentalError> {
    let booking = state
        .booking_engine
        .set_booking_status(id, payload.status, &actor)
        .await?;
    let view = state.booking_engine.booking_view(booking.id).await?;

    Ok(Json(json!({
        "message": format!("Booking status updated to '{}'", booking.status),
        "booking": view,
    })))
}

/// Admin: point-in-time aggregate statistics
pub async fn admin_dashboard(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RentalError> {
    let stats = state.booking_engine.dashboard_stats().await?;
    Ok(Json(json!({ "stats": stats })))
}
