//! # Service Error Types
//!
//! The closed set of outcomes a service call can fail with, and the
//! transport-facing [`ApiError`] they map to.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the PVZ Backend                        │
//! │                                                                         │
//! │  ValidationError ──────────────────────┐                               │
//! │  (pvz-core, before any transaction)    │                               │
//! │                                        ▼                               │
//! │  DbError ──► translated per operation ──► ServiceError ──► ApiError    │
//! │  (pvz-db)    NotFound("Point") → NotFound(Entity::Point)   code        │
//! │              UniqueViolation  → UserAlreadyExists          message     │
//! │              anything else    → Infrastructure(..)         http_status │
//! │                                                                         │
//! │  Business rejections (not found, invalid state, auth) are expected     │
//! │  outcomes: logged at WARN, never counted as errors in metrics.         │
//! │  Infrastructure failures are logged at ERROR and genericised.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use pvz_core::ValidationError;
use pvz_db::{DbError, Retryable};
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Domain Vocabulary
// =============================================================================

/// Things a caller can ask for that may not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    City,
    Point,
    Reception,
    Product,
    User,
}

impl Entity {
    /// Entity name as used by repository `NotFound` errors.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Entity::City => "City",
            Entity::Point => "Point",
            Entity::Reception => "Reception",
            Entity::Product => "Product",
            Entity::User => "User",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reception state rules a request can break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateViolation {
    /// Opening while the latest reception is still in progress.
    #[error("last reception is not closed")]
    LastReceptionNotClosed,

    /// Closing when the latest reception is closed or there is none.
    #[error("last reception is already closed")]
    LastReceptionAlreadyClosed,

    /// Adding or withdrawing a product without an open reception.
    #[error("reception is already closed")]
    ReceptionAlreadyClosed,

    /// Closing a reception with no products.
    #[error("cannot close an empty reception")]
    CannotCloseEmptyReception,
}

// =============================================================================
// Service Error
// =============================================================================

/// Every way a service operation can fail.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("{0}")]
    InvalidState(StateViolation),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid access token")]
    InvalidAccessToken,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("forbidden")]
    Forbidden,

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage failure: {0}")]
    Infrastructure(#[from] DbError),

    #[error("token failure: {0}")]
    Token(String),

    #[error("password hashing failure: {0}")]
    Hashing(String),

    #[error("metrics failure: {0}")]
    Metrics(String),
}

impl ServiceError {
    /// Translates a repository `NotFound` for `entity` into the domain outcome;
    /// any other storage error stays an infrastructure failure.
    pub fn missing(err: DbError, entity: Entity) -> Self {
        if err.is_not_found(entity.as_str()) {
            ServiceError::NotFound(entity)
        } else {
            ServiceError::Infrastructure(err)
        }
    }

    /// Expected outcomes of a well-formed request against current state.
    pub fn is_business_rejection(&self) -> bool {
        match self {
            ServiceError::NotFound(_)
            | ServiceError::UserAlreadyExists
            | ServiceError::InvalidState(_)
            | ServiceError::InvalidCredentials
            | ServiceError::InvalidAccessToken
            | ServiceError::InvalidRefreshToken
            | ServiceError::Forbidden
            | ServiceError::Validation(_) => true,
            ServiceError::Infrastructure(_)
            | ServiceError::Token(_)
            | ServiceError::Hashing(_)
            | ServiceError::Metrics(_) => false,
        }
    }

    /// Rejections the reception lifecycle treats as routine: an unknown point,
    /// or an open while another reception is still in progress.
    pub fn is_expected_lifecycle_rejection(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound(Entity::Point)
                | ServiceError::InvalidState(StateViolation::LastReceptionNotClosed)
        )
    }

    /// Logs the failure of `operation` at the level its kind deserves.
    pub(crate) fn report(&self, operation: &'static str) {
        if self.is_business_rejection() {
            tracing::warn!(operation, error = %self, "Request rejected");
        } else {
            tracing::error!(operation, error = %self, "Request failed");
        }
    }
}

impl From<StateViolation> for ServiceError {
    fn from(violation: StateViolation) -> Self {
        ServiceError::InvalidState(violation)
    }
}

impl Retryable for ServiceError {
    fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Infrastructure(err) if err.is_busy())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// API Error
// =============================================================================

/// Error shape handed to a transport layer.
///
/// ```json
/// { "code": "INVALID_STATE", "message": "last reception is not closed" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Reception state rule violated (400)
    InvalidState,

    /// Resource already exists (409)
    Conflict,

    /// Missing or bad credentials/token (401)
    Unauthorized,

    /// Authenticated but wrong role (403)
    Forbidden,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status a transport should answer with.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError | ErrorCode::InvalidState => 400,
            ErrorCode::Conflict => 409,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

/// Converts service errors to API errors.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),
            ServiceError::UserAlreadyExists => ApiError::new(ErrorCode::Conflict, err.to_string()),
            ServiceError::InvalidState(_) => ApiError::new(ErrorCode::InvalidState, err.to_string()),
            ServiceError::InvalidCredentials
            | ServiceError::InvalidAccessToken
            | ServiceError::InvalidRefreshToken => {
                ApiError::new(ErrorCode::Unauthorized, err.to_string())
            }
            ServiceError::Forbidden => ApiError::new(ErrorCode::Forbidden, err.to_string()),
            ServiceError::Validation(e) => ApiError::new(ErrorCode::ValidationError, e.to_string()),
            ServiceError::Infrastructure(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            ServiceError::Token(e) | ServiceError::Hashing(e) | ServiceError::Metrics(e) => {
                tracing::error!("Internal failure: {}", e);
                ApiError::new(ErrorCode::Internal, "Internal error")
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================
