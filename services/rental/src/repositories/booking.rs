//! Booking repository for database operations
//!
//! Creation runs its availability checks and the insert inside a single
//! transaction that locks the car row first, so two concurrent requests for
//! the same car serialize instead of double-booking. The partial exclusion
//! constraint on (car_id, daterange) backstops the same invariant at the
//! schema level.

use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::availability::rental_days;
use crate::error::{
    RentalError, RentalResult, SQLSTATE_EXCLUSION_VIOLATION, db_error_code,
};
use crate::models::{
    Booking, BookingCounts, BookingListQuery, BookingStatus, BookingView, CarStatus, CarSummary,
    UserSummary,
};

const BOOKING_COLUMNS: &str =
    "id, user_id, car_id, start_date, end_date, total_price, status, created_at";

const VIEW_SELECT: &str = r#"
    SELECT b.id, b.start_date, b.end_date, b.total_price, b.status, b.created_at,
           u.id AS user_id, u.username, u.email,
           c.id AS car_id, c.make, c.model, c.year, c.price_per_day, c.image_url
    FROM bookings AS b
    INNER JOIN users AS u ON b.user_id = u.id
    INNER JOIN cars AS c ON b.car_id = c.id
"#;

/// Booking repository
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a booking for the given car and window
    ///
    /// The caller is expected to have validated the window structurally
    /// (end after start, start not in the past). This method owns the rest of
    /// the checks, in order: car existence, car-status gate, overlap against
    /// active bookings, minimum duration. The car row stays locked from the
    /// first check until commit.
    pub async fn create(
        &self,
        user_id: Uuid,
        car_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RentalResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let car_row = sqlx::query("SELECT price_per_day, status FROM cars WHERE id = $1 FOR UPDATE")
            .bind(car_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(car_row) = car_row else {
            return Err(RentalError::NotFound {
                entity: "car",
                id: car_id,
            });
        };

        let status: CarStatus = car_row.get("status");
        if status != CarStatus::Available {
            return Err(RentalError::State(format!(
                "Car is not currently available for booking (status: {})",
                status
            )));
        }

        let conflict = sqlx::query(
            r#"
            SELECT id
            FROM bookings
            WHERE car_id = $1
              AND status IN ('pending', 'confirmed')
              AND start_date < $3
              AND end_date > $2
            LIMIT 1
            "#,
        )
        .bind(car_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_optional(&mut *tx)
        .await?;

        if conflict.is_some() {
            return Err(RentalError::Conflict {
                car_id,
                start: start_date,
                end: end_date,
            });
        }

        let days = rental_days(start_date, end_date);
        if days < 1 {
            return Err(RentalError::Validation(
                "Booking duration must be at least 1 day".to_string(),
            ));
        }

        let price_per_day: f64 = car_row.get("price_per_day");
        let total_price = days as f64 * price_per_day;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bookings (user_id, car_id, start_date, end_date, total_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BOOKING_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(car_id)
        .bind(start_date)
        .bind(end_date)
        .bind(total_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // The exclusion constraint catches anything that slipped past the
            // in-transaction check.
            if db_error_code(&e).as_deref() == Some(SQLSTATE_EXCLUSION_VIOLATION) {
                RentalError::Conflict {
                    car_id,
                    start: start_date,
                    end: end_date,
                }
            } else {
                RentalError::Database(e)
            }
        })?;

        tx.commit().await?;

        let booking = booking_from_row(&row);
        info!(
            "Created booking {} for car {} ({} to {})",
            booking.id, car_id, start_date, end_date
        );
        Ok(booking)
    }

    /// Find a booking by ID
    pub async fn find_by_id(&self, id: Uuid) -> RentalResult<Option<Booking>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(booking_from_row))
    }

    /// Find a booking by ID with user and car summaries attached
    pub async fn find_view_by_id(&self, id: Uuid) -> RentalResult<Option<BookingView>> {
        let row = sqlx::query(&format!("{VIEW_SELECT} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(view_from_row))
    }

    /// All bookings for a user, most recent start date first
    pub async fn find_by_user(&self, user_id: Uuid) -> RentalResult<Vec<BookingView>> {
        let rows = sqlx::query(&format!(
            "{VIEW_SELECT} WHERE b.user_id = $1 ORDER BY b.start_date DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(view_from_row).collect())
    }

    /// Filtered, paginated, sorted booking list with the total match count
    pub async fn list(
        &self,
        query: &BookingListQuery,
        limit: u32,
        offset: i64,
    ) -> RentalResult<(Vec<BookingView>, i64)> {
        let sort_column = sort_column(query.sort_by.as_deref());
        let sort_order = sort_order(query.order.as_deref());

        let mut qb = sqlx::QueryBuilder::new(VIEW_SELECT);
        qb.push(" WHERE 1=1");
        push_booking_filters(&mut qb, query);
        qb.push(format!(" ORDER BY {} {}", sort_column, sort_order));
        qb.push(" LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let bookings = rows.iter().map(view_from_row).collect();

        let mut count_qb = sqlx::QueryBuilder::new("SELECT COUNT(*) AS count FROM bookings AS b WHERE 1=1");
        push_booking_filters(&mut count_qb, query);
        let count_row = count_qb.build().fetch_one(&self.pool).await?;
        let total: i64 = count_row.get("count");

        Ok((bookings, total))
    }

    /// Persist a status change
    pub async fn update_status(&self, id: Uuid, status: BookingStatus) -> RentalResult<Booking> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE bookings
            SET status = $1
            WHERE id = $2
            RETURNING {BOOKING_COLUMNS}
            "#,
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(RentalError::NotFound {
                entity: "booking",
                id,
            });
        };

        info!("Booking {} status set to {}", id, status);
        Ok(booking_from_row(&row))
    }

    /// Booking counts by status for the dashboard
    pub async fn count_by_status(&self) -> RentalResult<BookingCounts> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM bookings
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = BookingCounts::default();
        for row in rows {
            let status: BookingStatus = row.get("status");
            let count: i64 = row.get("count");
            counts.total += count;
            match status {
                BookingStatus::Pending => counts.pending = count,
                BookingStatus::Confirmed => counts.confirmed = count,
                BookingStatus::Declined => counts.declined = count,
                BookingStatus::Cancelled => counts.cancelled = count,
                BookingStatus::Completed => counts.completed = count,
            }
        }

        Ok(counts)
    }

    /// Total revenue over completed bookings
    pub async fn completed_revenue(&self) -> RentalResult<f64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(total_price), 0) AS revenue
            FROM bookings
            WHERE status = 'completed'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("revenue"))
    }

    /// The n most recently created bookings with summaries
    pub async fn recent(&self, n: i64) -> RentalResult<Vec<BookingView>> {
        let rows = sqlx::query(&format!(
            "{VIEW_SELECT} ORDER BY b.created_at DESC LIMIT $1"
        ))
        .bind(n)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(view_from_row).collect())
    }
}

fn push_booking_filters(qb: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, query: &BookingListQuery) {
    if let Some(status) = query.status {
        qb.push(" AND b.status = ");
        qb.push_bind(status);
    }
    if let Some(user_id) = query.user_id {
        qb.push(" AND b.user_id = ");
        qb.push_bind(user_id);
    }
    if let Some(car_id) = query.car_id {
        qb.push(" AND b.car_id = ");
        qb.push_bind(car_id);
    }
}

/// Sort field whitelist; anything unrecognized falls back to creation time
pub(crate) fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("start_date") => "b.start_date",
        Some("end_date") => "b.end_date",
        Some("total_price") => "b.total_price",
        _ => "b.created_at",
    }
}

pub(crate) fn sort_order(order: Option<&str>) -> &'static str {
    match order {
        Some("asc") => "ASC",
        _ => "DESC",
    }
}

pub(crate) fn booking_from_row(row: &sqlx::postgres::PgRow) -> Booking {
    Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        car_id: row.get("car_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        total_price: row.get("total_price"),
        status: row.get::<BookingStatus, _>("status"),
        created_at: row.get("created_at"),
    }
}

fn view_from_row(row: &sqlx::postgres::PgRow) -> BookingView {
    BookingView {
        id: row.get("id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        total_price: row.get("total_price"),
        status: row.get::<BookingStatus, _>("status"),
        created_at: row.get("created_at"),
        user: UserSummary {
            id: row.get("user_id"),
            username: row.get("username"),
            email: row.get("email"),
        },
        car: CarSummary {
            id: row.get("car_id"),
            make: row.get("make"),
            model: row.get("model"),
            year: row.get("year"),
            price_per_day: row.get("price_per_day"),
            image_url: row.get("image_url"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_whitelist_rejects_unknown_columns() {
        assert_eq!(sort_column(Some("start_date")), "b.start_date");
        assert_eq!(sort_column(Some("total_price")), "b.total_price");
        assert_eq!(sort_column(Some("created_at")), "b.created_at");
        // Nothing outside the whitelist reaches the SQL string.
        assert_eq!(sort_column(Some("username; DROP TABLE users")), "b.created_at");
        assert_eq!(sort_column(None), "b.created_at");
    }

    #[test]
    fn sort_order_defaults_to_descending() {
        assert_eq!(sort_order(Some("asc")), "ASC");
        assert_eq!(sort_order(Some("desc")), "DESC");
        assert_eq!(sort_order(Some("sideways")), "DESC");
        assert_eq!(sort_order(None), "DESC");
    }
}
