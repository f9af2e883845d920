//! Car repository for database operations

use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{
    RentalError, RentalResult, SQLSTATE_FOREIGN_KEY_VIOLATION, db_error_code,
};
use crate::models::{Car, CarCounts, CarFilter, CarForm, CarStatus};

const CAR_COLUMNS: &str =
    "id, make, model, year, price_per_day, status, image_url, features, created_at";

/// Car repository
#[derive(Clone)]
pub struct CarRepository {
    pool: PgPool,
}

impl CarRepository {
    /// Create a new car repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new car
    pub async fn create(&self, form: &CarForm) -> RentalResult<Car> {
        info!("Creating car: {} {}", form.make, form.model);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO cars (make, model, year, price_per_day, status, image_url, features)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CAR_COLUMNS}
            "#,
        ))
        .bind(form.make.trim())
        .bind(form.model.trim())
        .bind(form.year)
        .bind(form.price_per_day)
        .bind(form.status.unwrap_or(CarStatus::Available))
        .bind(&form.image_url)
        .bind(form.features.clone().unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;

        Ok(car_from_row(&row))
    }

    /// Find a car by ID
    pub async fn find_by_id(&self, id: Uuid) -> RentalResult<Option<Car>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {CAR_COLUMNS}
            FROM cars
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(car_from_row))
    }

    /// List cars matching the filter, newest first
    pub async fn list(&self, filter: &CarFilter) -> RentalResult<Vec<Car>> {
        let mut qb = sqlx::QueryBuilder::new(format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE 1=1"
        ));

        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }

        if let Some(search) = filter.search.as_deref() {
            let search = search.trim();
            if !search.is_empty() {
                let pattern = format!("%{}%", search);
                qb.push(" AND (make ILIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" OR model ILIKE ");
                qb.push_bind(pattern);
                qb.push(")");
            }
        }

        if let Some(min_price) = filter.min_price {
            qb.push(" AND price_per_day >= ");
            qb.push_bind(min_price);
        }

        if let Some(max_price) = filter.max_price {
            qb.push(" AND price_per_day <= ");
            qb.push_bind(max_price);
        }

        qb.push(" ORDER BY created_at DESC");

        let rows = qb.build().fetch_all(&self.pool).await?;

        Ok(rows.iter().map(car_from_row).collect())
    }

    /// Update a car in place (full-field update, missing optionals keep the
    /// stored value)
    pub async fn update(&self, id: Uuid, form: &CarForm) -> RentalResult<Car> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(RentalError::NotFound { entity: "car", id })?;

        let status = form.status.unwrap_or(existing.status);
        let features = form.features.clone().unwrap_or(existing.features);
        let image_url = form.image_url.clone().or(existing.image_url);

        let row = sqlx::query(&format!(
            r#"
            UPDATE cars
            SET make = $1, model = $2, year = $3, price_per_day = $4,
                status = $5, image_url = $6, features = $7
            WHERE id = $8
            RETURNING {CAR_COLUMNS}
            "#,
        ))
        .bind(form.make.trim())
        .bind(form.model.trim())
        .bind(form.year)
        .bind(form.price_per_day)
        .bind(status)
        .bind(image_url)
        .bind(features)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(car_from_row(&row))
    }

    /// Delete a car
    ///
    /// Bookings reference cars without a cascade, so a car with booking
    /// history cannot be removed.
    pub async fn delete(&self, id: Uuid) -> RentalResult<()> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if db_error_code(&e).as_deref() == Some(SQLSTATE_FOREIGN_KEY_VIOLATION) {
                    RentalError::State(format!(
                        "Car {} still has bookings and cannot be deleted",
                        id
                    ))
                } else {
                    RentalError::Database(e)
                }
            })?;

        if result.rows_affected() < 1 {
            return Err(RentalError::NotFound { entity: "car", id });
        }

        info!("Deleted car: {}", id);
        Ok(())
    }

    /// Car counts by status for the dashboard
    pub async fn count_by_status(&self) -> RentalResult<CarCounts> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM cars
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = CarCounts::default();
        for row in rows {
            let status: CarStatus = row.get("status");
            let count: i64 = row.get("count");
            counts.total += count;
            match status {
                CarStatus::Available => counts.available = count,
                CarStatus::Booked => counts.booked = count,
                CarStatus::Maintenance => counts.maintenance = count,
            }
        }

        Ok(counts)
    }
}

pub(crate) fn car_from_row(row: &sqlx::postgres::PgRow) -> Car {
    Car {
        id: row.get("id"),
        make: row.get("make"),
        model: row.get("model"),
        year: row.get("year"),
        price_per_day: row.get("price_per_day"),
        status: row.get::<CarStatus, _>("status"),
        image_url: row.get("image_url"),
        features: row.get("features"),
        created_at: row.get("created_at"),
    }
}
