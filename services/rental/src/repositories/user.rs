//! Read-only user lookups against the shared users table
//!
//! The rental service never mutates identity data; it only needs existence
//! and ownership checks plus the role counts for the dashboard.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::RentalResult;
use crate::models::{UserCounts, UserSummary};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user summary by ID
    pub async fn find_summary(&self, id: Uuid) -> RentalResult<Option<UserSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserSummary {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
        }))
    }

    /// User counts by role for the dashboard
    ///
    /// `total` counts regular users only; admins are reported separately.
    pub async fn count_by_role(&self) -> RentalResult<UserCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE role = 'user') AS users,
                COUNT(*) FILTER (WHERE role = 'admin') AS admins
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(UserCounts {
            total: row.get("users"),
            admins: row.get("admins"),
        })
    }
}
