//! Booking engine
//!
//! Validates and creates booking requests, arbitrates date-range conflicts,
//! drives status transitions, and computes the dashboard aggregates. The
//! authenticated actor is passed explicitly into every mutating operation;
//! there is no ambient identity.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::availability::validate_dates;
use crate::error::{RentalError, RentalResult};
use crate::models::{
    Actor, Booking, BookingListQuery, BookingListResponse, BookingStatus, BookingView,
    CreateBookingRequest, DashboardStats, Pagination, Revenue, Role,
};
use crate::repositories::{BookingRepository, CarRepository, UserRepository};
use crate::transitions::{self, TransitionActor};

/// How many bookings the dashboard shows as "recent"
const RECENT_BOOKINGS: i64 = 5;

/// Booking engine composing the booking, car, and user repositories
#[derive(Clone)]
pub struct BookingEngine {
    bookings: BookingRepository,
    cars: CarRepository,
    users: UserRepository,
}

impl BookingEngine {
    /// Create a new booking engine
    pub fn new(bookings: BookingRepository, cars: CarRepository, users: UserRepository) -> Self {
        Self {
            bookings,
            cars,
            users,
        }
    }

    /// Create a booking request on behalf of the actor
    ///
    /// Validation order: window structure, start not in the past, car
    /// existence, car-status gate, overlap against active bookings, minimum
    /// duration. The storage-side checks run under a per-car lock.
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: &CreateBookingRequest,
    ) -> RentalResult<Booking> {
        let today = Utc::now().date_naive();
        validate_dates(request.start_date, request.end_date, today)?;

        // The actor came from a verified token, but the booking must never
        // reference an identity row that is gone.
        self.users
            .find_summary(actor.id)
            .await?
            .ok_or(RentalError::NotFound {
                entity: "user",
                id: actor.id,
            })?;

        self.bookings
            .create(actor.id, request.car_id, request.start_date, request.end_date)
            .await
    }

    /// Cancel a booking; only the owning user may do this
    pub async fn cancel_booking(&self, booking_id: Uuid, actor: &Actor) -> RentalResult<Booking> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(RentalError::NotFound {
                entity: "booking",
                id: booking_id,
            })?;

        if booking.user_id != actor.id {
            return Err(RentalError::Authorization(
                "You are not authorized to cancel this booking".to_string(),
            ));
        }

        transitions::authorize(
            TransitionActor::Owner,
            booking.status,
            BookingStatus::Cancelled,
        )?;

        self.bookings
            .update_status(booking_id, BookingStatus::Cancelled)
            .await
    }

    /// Set a booking status; admin only, table-driven policy
    pub async fn set_booking_status(
        &self,
        booking_id: Uuid,
        requested: BookingStatus,
        actor: &Actor,
    ) -> RentalResult<Booking> {
        if actor.role != Role::Admin {
            return Err(RentalError::Authorization(
                "Only administrators can change booking status".to_string(),
            ));
        }

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(RentalError::NotFound {
                entity: "booking",
                id: booking_id,
            })?;

        transitions::authorize(TransitionActor::Admin, booking.status, requested)?;

        info!(
            "Admin {} moving booking {} from {} to {}",
            actor.id, booking_id, booking.status, requested
        );

        self.bookings.update_status(booking_id, requested).await
    }

    /// All bookings belonging to a user, most recent start first
    pub async fn list_user_bookings(&self, user_id: Uuid) -> RentalResult<Vec<BookingView>> {
        self.bookings.find_by_user(user_id).await
    }

    /// Admin listing with filters, pagination, and sorting
    pub async fn list_all_bookings(
        &self,
        query: &BookingListQuery,
    ) -> RentalResult<BookingListResponse> {
        let (page, limit) = normalize_paging(query.page, query.limit);
        let offset = (page as i64 - 1) * limit as i64;

        let (bookings, total) = self.bookings.list(query, limit, offset).await?;

        Ok(BookingListResponse {
            bookings,
            pagination: paginate(total, page, limit),
        })
    }

    /// Booking with summaries, for response bodies
    pub async fn booking_view(&self, booking_id: Uuid) -> RentalResult<BookingView> {
        self.bookings
            .find_view_by_id(booking_id)
            .await?
            .ok_or(RentalError::NotFound {
                entity: "booking",
                id: booking_id,
            })
    }

    /// Point-in-time dashboard aggregates; every call recomputes from the
    /// current store state
    pub async fn dashboard_stats(&self) -> RentalResult<DashboardStats> {
        let users = self.users.count_by_role().await?;
        let cars = self.cars.count_by_status().await?;
        let bookings = self.bookings.count_by_status().await?;
        let recent_bookings = self.bookings.recent(RECENT_BOOKINGS).await?;
        let total_completed_revenue = self.bookings.completed_revenue().await?;

        Ok(DashboardStats {
            users,
            cars,
            bookings,
            recent_bookings,
            revenue: Revenue {
                total_completed_revenue,
            },
        })
    }
}

/// Clamp raw paging parameters: page defaults to 1, limit to 10 (max 100)
fn normalize_paging(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    (page, limit)
}

fn paginate(total: i64, page: u32, limit: u32) -> Pagination {
    let total_pages = (total as u64).div_ceil(limit as u64) as u32;
    Pagination {
        current_page: page,
        total_pages,
        total_bookings: total,
        limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_bounds() {
        assert_eq!(normalize_paging(None, None), (1, 10));
        assert_eq!(normalize_paging(Some(0), Some(0)), (1, 1));
        assert_eq!(normalize_paging(Some(3), Some(500)), (3, 100));
    }

    #[test]
    fn pagination_math_rounds_up() {
        let p = paginate(25, 1, 10);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.total_bookings, 25);

        let p = paginate(0, 1, 10);
        assert_eq!(p.total_pages, 0);

        let p = paginate(10, 1, 10);
        assert_eq!(p.total_pages, 1);
    }

    // Live-database scenarios. Run with `cargo test -- --ignored` against a
    // migrated PostgreSQL instance (DATABASE_URL must be set).

    use crate::models::{CarForm, CarStatus};
    use chrono::{Duration, NaiveDate, Utc};
    use sqlx::PgPool;

    async fn live_engine() -> (BookingEngine, PgPool) {
        let config =
            common::database::DatabaseConfig::from_env().expect("DATABASE_URL must be set");
        let pool = common::database::init_pool(&config)
            .await
            .expect("failed to connect to the test database");
        let engine = BookingEngine::new(
            BookingRepository::new(pool.clone()),
            CarRepository::new(pool.clone()),
            UserRepository::new(pool.clone()),
        );
        (engine, pool)
    }

    async fn seed_user(pool: &PgPool, role: &str) -> Actor {
        let id = Uuid::new_v4();
        let name = format!("u_{}", &id.simple().to_string()[..12]);
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, 'not-a-real-hash', $4::user_role)
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(format!("{}@example.com", name))
        .bind(role)
        .execute(pool)
        .await
        .expect("failed to seed user");

        Actor {
            id,
            role: role.parse().expect("seed role"),
        }
    }

    async fn seed_car(pool: &PgPool, price_per_day: f64, status: CarStatus) -> Uuid {
        let cars = CarRepository::new(pool.clone());
        let car = cars
            .create(&CarForm {
                make: "Honda".to_string(),
                model: "Civic".to_string(),
                year: 2023,
                price_per_day,
                status: Some(status),
                image_url: None,
                features: None,
            })
            .await
            .expect("failed to seed car");
        car.id
    }

    fn from_today(days: i64) -> NaiveDate {
        Utc::now().date_naive() + Duration::days(days)
    }

    fn request(car_id: Uuid, start: i64, end: i64) -> CreateBookingRequest {
        CreateBookingRequest {
            car_id,
            start_date: from_today(start),
            end_date: from_today(end),
        }
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database"]
    async fn creating_a_booking_freezes_price_and_defaults_to_pending() {
        let (engine, pool) = live_engine().await;
        let actor = seed_user(&pool, "user").await;
        let car_id = seed_car(&pool, 60.0, CarStatus::Available).await;

        let booking = engine
            .create_booking(&actor, &request(car_id, 10, 12))
            .await
            .expect("booking should succeed");

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_price, 120.0);
        assert_eq!(booking.duration_days(), 2);
        assert!(booking.start_date < booking.end_date);
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database"]
    async fn overlapping_request_conflicts_but_adjacent_does_not() {
        let (engine, pool) = live_engine().await;
        let first = seed_user(&pool, "user").await;
        let second = seed_user(&pool, "user").await;
        let car_id = seed_car(&pool, 60.0, CarStatus::Available).await;

        let booking = engine
            .create_booking(&first, &request(car_id, 10, 12))
            .await
            .expect("first booking should succeed");
        BookingRepository::new(pool.clone())
            .update_status(booking.id, BookingStatus::Confirmed)
            .await
            .expect("confirm");

        let err = engine
            .create_booking(&second, &request(car_id, 11, 13))
            .await
            .expect_err("overlap should be rejected");
        assert!(matches!(err, RentalError::Conflict { .. }));

        // Half-open ranges: starting on the first booking's end date is fine.
        engine
            .create_booking(&second, &request(car_id, 12, 14))
            .await
            .expect("adjacent booking should succeed");
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database"]
    async fn unavailable_car_is_rejected_regardless_of_dates() {
        let (engine, pool) = live_engine().await;
        let actor = seed_user(&pool, "user").await;
        let car_id = seed_car(&pool, 60.0, CarStatus::Maintenance).await;

        let err = engine
            .create_booking(&actor, &request(car_id, 10, 12))
            .await
            .expect_err("maintenance car should be rejected");
        assert!(matches!(err, RentalError::State(_)));
        assert!(err.to_string().contains("not currently available"));
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database"]
    async fn terminal_booking_rejects_further_transitions() {
        let (engine, pool) = live_engine().await;
        let owner = seed_user(&pool, "user").await;
        let admin = seed_user(&pool, "admin").await;
        let car_id = seed_car(&pool, 60.0, CarStatus::Available).await;

        let booking = engine
            .create_booking(&owner, &request(car_id, 10, 12))
            .await
            .expect("booking should succeed");

        engine
            .set_booking_status(booking.id, BookingStatus::Confirmed, &admin)
            .await
            .expect("pending -> confirmed");
        engine
            .set_booking_status(booking.id, BookingStatus::Completed, &admin)
            .await
            .expect("confirmed -> completed");

        let err = engine
            .set_booking_status(booking.id, BookingStatus::Pending, &admin)
            .await
            .expect_err("completed is terminal");
        assert!(matches!(err, RentalError::State(_)));
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database"]
    async fn only_the_owner_may_cancel() {
        let (engine, pool) = live_engine().await;
        let owner = seed_user(&pool, "user").await;
        let stranger = seed_user(&pool, "user").await;
        let car_id = seed_car(&pool, 60.0, CarStatus::Available).await;

        let booking = engine
            .create_booking(&owner, &request(car_id, 10, 12))
            .await
            .expect("booking should succeed");

        let err = engine
            .cancel_booking(booking.id, &stranger)
            .await
            .expect_err("non-owner cancel must be rejected");
        assert!(matches!(err, RentalError::Authorization(_)));

        let cancelled = engine
            .cancel_booking(booking.id, &owner)
            .await
            .expect("owner cancel should succeed");
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database"]
    async fn revenue_counts_completed_bookings_only() {
        let (engine, pool) = live_engine().await;
        let actor = seed_user(&pool, "user").await;
        let completed_car = seed_car(&pool, 60.0, CarStatus::Available).await;
        let pending_car = seed_car(&pool, 30.0, CarStatus::Available).await;

        let before = engine.dashboard_stats().await.expect("stats");

        let done = engine
            .create_booking(&actor, &request(completed_car, 10, 12))
            .await
            .expect("booking should succeed");
        BookingRepository::new(pool.clone())
            .update_status(done.id, BookingStatus::Completed)
            .await
            .expect("complete");

        // 3 days at 30/day stays pending and must not count.
        engine
            .create_booking(&actor, &request(pending_car, 10, 13))
            .await
            .expect("pending booking should succeed");

        let after = engine.dashboard_stats().await.expect("stats");
        assert_eq!(
            after.revenue.total_completed_revenue - before.revenue.total_completed_revenue,
            120.0
        );
        assert_eq!(after.bookings.total - before.bookings.total, 2);
    }
}
