//! # User Repository
//!
//! Database operations for accounts and their single active refresh token.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pvz_core::User;

/// Repository for user database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserRepository;

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new() -> Self {
        UserRepository
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation { .. })` - Email already registered
    pub async fn create(&self, conn: &mut SqliteConnection, user: &User) -> DbResult<()> {
        debug!(id = %user.id, email = %user.email, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, role, refresh_token, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.refresh_token.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, user.email.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Gets a user by email.
    pub async fn get_by_email(
        &self,
        conn: &mut SqliteConnection,
        email: &str,
    ) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, refresh_token, created_at, updated_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, refresh_token, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    /// Replaces the user's refresh token; `None` clears it.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound { entity: "User", .. })` - Unknown user
    pub async fn update_refresh_token(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        refresh_token: Option<&str>,
    ) -> DbResult<()> {
        debug!(id = %id, clearing = refresh_token.is_none(), "Updating refresh token");

        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(refresh_token)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
