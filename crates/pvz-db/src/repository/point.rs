//! # Point Repository
//!
//! Database operations for pickup points.
//!
//! Points are created only for cities present in the `cities` table; the
//! insert selects from it, so an unknown city inserts nothing and surfaces as
//! `NotFound("City")`.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pvz_core::{Point, PointFilter};

/// Repository for point database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointRepository;

impl PointRepository {
    /// Creates a new PointRepository.
    pub fn new() -> Self {
        PointRepository
    }

    /// Inserts a point for an allow-listed city.
    ///
    /// ## Returns
    /// * `Ok(Point)` - Created point
    /// * `Err(DbError::NotFound { entity: "City", .. })` - City not in allow-list
    pub async fn create(&self, conn: &mut SqliteConnection, city: &str) -> DbResult<Point> {
        let point = Point {
            id: Uuid::new_v4(),
            city: city.to_string(),
            created_at: Utc::now(),
        };
        debug!(id = %point.id, city = %point.city, "Inserting point");

        let result = sqlx::query(
            r#"
            INSERT INTO points (id, city, created_at)
            SELECT ?1, name, ?3
            FROM cities
            WHERE name = ?2
            "#,
        )
        .bind(point.id)
        .bind(&point.city)
        .bind(point.created_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("City", city));
        }

        Ok(point)
    }

    /// Locks the point row for the rest of the transaction.
    ///
    /// A no-op UPDATE makes SQLite take the database write lock before
    /// anything else is read, so concurrent lifecycle operations on any point
    /// serialize. Doubles as the existence check.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound { entity: "Point", .. })` - Point doesn't exist
    pub async fn lock(&self, conn: &mut SqliteConnection, id: Uuid) -> DbResult<()> {
        debug!(id = %id, "Locking point");

        let result = sqlx::query("UPDATE points SET id = id WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Point", id));
        }

        Ok(())
    }

    /// Checks whether a point exists without locking it.
    pub async fn exists(&self, conn: &mut SqliteConnection, id: Uuid) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM points WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(found.is_some())
    }

    /// Lists all points in insertion order.
    pub async fn list_all(&self, conn: &mut SqliteConnection) -> DbResult<Vec<Point>> {
        let points = sqlx::query_as::<_, Point>(
            "SELECT id, city, created_at FROM points ORDER BY seq ASC",
        )
        .fetch_all(&mut *conn)
        .await?;

        debug!(count = points.len(), "Listed points");
        Ok(points)
    }

    /// Lists one page of points in insertion order.
    ///
    /// With a date window, only points having at least one reception created
    /// inside it are returned.
    pub async fn list_page(
        &self,
        conn: &mut SqliteConnection,
        filter: &PointFilter,
    ) -> DbResult<Vec<Point>> {
        debug!(page = filter.page, limit = filter.limit, windowed = filter.has_window(), "Listing points page");

        let points = sqlx::query_as::<_, Point>(
            r#"
            SELECT p.id, p.city, p.created_at
            FROM points p
            WHERE ?1 = 0 OR EXISTS (
                SELECT 1 FROM receptions r
                WHERE r.point_id = p.id
                  AND (?2 IS NULL OR r.created_at >= ?2)
                  AND (?3 IS NULL OR r.created_at <= ?3)
            )
            ORDER BY p.seq ASC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(filter.has_window())
        .bind(filter.start)
        .bind(filter.end)
        .bind(i64::from(filter.limit))
        .bind(filter.offset() as i64)
        .fetch_all(&mut *conn)
        .await?;

        Ok(points)
    }

    /// Returns the total number of points.
    pub async fn count(&self, conn: &mut SqliteConnection) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points")
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
