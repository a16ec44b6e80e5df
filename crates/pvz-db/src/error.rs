//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├── Busy ──► Transactor retries with backoff                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (pvz-service) ← Translated per operation                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError ← Generic message for infrastructure failures                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// SQLite result codes that signal a lock conflict.
///
/// BUSY (5), LOCKED (6) and their extended forms BUSY_RECOVERY (261),
/// LOCKED_SHAREDCACHE (262), BUSY_SNAPSHOT (517).
const LOCK_CONFLICT_CODES: [&str; 5] = ["5", "6", "261", "262", "517"];

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and translation at the service boundary.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - An UPDATE/DELETE keyed on an ID touched zero rows
    /// - A city outside the `cities` allow-list
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Registering an email twice
    /// - A second open reception for the same point
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The database is locked by another writer.
    ///
    /// ## When This Occurs
    /// - Busy timeout elapsed while waiting for the write lock
    /// - A read snapshot went stale before upgrading to a write
    ///
    /// Retried by the [`Transactor`](crate::Transactor).
    #[error("Database is busy: {0}")]
    Busy(String),

    /// The transaction did not finish before its deadline and was rolled back.
    #[error("Transaction timed out after {0} ms")]
    Timeout(u128),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether this error is a lock conflict worth retrying.
    pub fn is_busy(&self) -> bool {
        matches!(self, DbError::Busy(_))
    }

    /// Whether this error is a NotFound for the given entity.
    pub fn is_not_found(&self, entity: &str) -> bool {
        matches!(self, DbError::NotFound { entity: e, .. } if e == entity)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Lock conflict or constraint type by code/message
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                let lock_code = db_err
                    .code()
                    .map(|code| LOCK_CONFLICT_CODES.contains(&code.as_ref()))
                    .unwrap_or(false);

                if lock_code || msg.contains("database is locked") || msg.contains("table is locked") {
                    DbError::Busy(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    // "UNIQUE constraint failed: <table>.<column>"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let err = DbError::not_found("Point", uuid::Uuid::nil());
        assert!(err.is_not_found("Point"));
        assert!(!err.is_not_found("Reception"));
        assert_eq!(
            err.to_string(),
            "Point not found: 00000000-0000-0000-0000-000000000000"
        );

        let err = DbError::duplicate("users.email", "a@b.ru");
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(!err.is_busy());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found("Record"));
    }

    #[test]
    fn test_pool_timeout_maps_to_exhausted() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted));
    }
}
