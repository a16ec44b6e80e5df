//! # Reception Repository
//!
//! Database operations for receptions (intake sessions at a point).
//!
//! ## "Latest" Reception
//! ```text
//! receptions for point A, by seq:
//!
//!   seq 3  closed       ─┐
//!   seq 7  closed        │  ORDER BY seq DESC LIMIT 1
//!   seq 12 in_progress  ◄┘  = latest
//! ```
//! Every lifecycle decision looks only at the latest reception of a point.
//! A partial unique index also rejects a second `in_progress` row per point.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pvz_core::{Reception, ReceptionStatus};

/// Repository for reception database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceptionRepository;

impl ReceptionRepository {
    /// Creates a new ReceptionRepository.
    pub fn new() -> Self {
        ReceptionRepository
    }

    /// Inserts a new `in_progress` reception for the point.
    pub async fn open(&self, conn: &mut SqliteConnection, point_id: Uuid) -> DbResult<Reception> {
        let reception = Reception {
            id: Uuid::new_v4(),
            point_id,
            status: ReceptionStatus::InProgress,
            created_at: Utc::now(),
        };
        debug!(id = %reception.id, point_id = %point_id, "Inserting reception");

        sqlx::query(
            r#"
            INSERT INTO receptions (id, point_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(reception.id)
        .bind(reception.point_id)
        .bind(reception.status)
        .bind(reception.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(reception)
    }

    /// Gets the most recently created reception of the point.
    pub async fn latest(
        &self,
        conn: &mut SqliteConnection,
        point_id: Uuid,
    ) -> DbResult<Option<Reception>> {
        let reception = sqlx::query_as::<_, Reception>(
            r#"
            SELECT id, point_id, status, created_at
            FROM receptions
            WHERE point_id = ?1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(point_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(reception)
    }

    /// Gets the status of the latest reception; `None` if the point has none.
    pub async fn latest_status(
        &self,
        conn: &mut SqliteConnection,
        point_id: Uuid,
    ) -> DbResult<Option<ReceptionStatus>> {
        let status: Option<ReceptionStatus> = sqlx::query_scalar(
            r#"
            SELECT status
            FROM receptions
            WHERE point_id = ?1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(point_id)
        .fetch_optional(&mut *conn)
        .await?;

        debug!(point_id = %point_id, status = ?status, "Fetched latest reception status");
        Ok(status)
    }

    /// Counts products in the latest reception of the point (0 if none).
    pub async fn count_products_in_latest(
        &self,
        conn: &mut SqliteConnection,
        point_id: Uuid,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE reception_id = (
                SELECT id FROM receptions
                WHERE point_id = ?1
                ORDER BY seq DESC
                LIMIT 1
            )
            "#,
        )
        .bind(point_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    /// Marks the latest reception of the point as closed.
    ///
    /// ## Returns
    /// * `Ok(Reception)` - The reception, now closed
    /// * `Err(DbError::NotFound { entity: "Reception", .. })` - No open latest reception
    pub async fn close_latest(
        &self,
        conn: &mut SqliteConnection,
        point_id: Uuid,
    ) -> DbResult<Reception> {
        debug!(point_id = %point_id, "Closing latest reception");

        let result = sqlx::query(
            r#"
            UPDATE receptions
            SET status = ?2
            WHERE seq = (SELECT MAX(seq) FROM receptions WHERE point_id = ?1)
              AND status = ?3
            "#,
        )
        .bind(point_id)
        .bind(ReceptionStatus::Closed)
        .bind(ReceptionStatus::InProgress)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reception", point_id));
        }

        self.latest(conn, point_id)
            .await?
            .ok_or_else(|| DbError::not_found("Reception", point_id))
    }

    /// Lists the point's receptions in insertion order, optionally limited to
    /// those created inside an inclusive date window.
    pub async fn list_by_point(
        &self,
        conn: &mut SqliteConnection,
        point_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Reception>> {
        let receptions = sqlx::query_as::<_, Reception>(
            r#"
            SELECT id, point_id, status, created_at
            FROM receptions
            WHERE point_id = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
            ORDER BY seq ASC
            "#,
        )
        .bind(point_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *conn)
        .await?;

        Ok(receptions)
    }

    /// Counts receptions of the point that are `in_progress`.
    pub async fn count_open(&self, conn: &mut SqliteConnection, point_id: Uuid) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM receptions WHERE point_id = ?1 AND status = ?2",
        )
        .bind(point_id)
        .bind(ReceptionStatus::InProgress)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
