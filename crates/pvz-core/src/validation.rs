//! # Validation Module
//!
//! Input validation for the PVZ backend.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Service entry (Rust)                                         │
//! │  └── THIS MODULE: shape checks before any transaction opens            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services inside the transaction                              │
//! │  └── State rules (open/closed reception, point exists, ...)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on status/type/role                             │
//! │  ├── UNIQUE email, one open reception per point                        │
//! │  └── Foreign keys (city allow-list, point, reception)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whether a city is in the allow-list is a storage question (the `cities`
//! table); [`validate_city`] only checks shape.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::PointFilter;
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a city name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use pvz_core::validation::validate_city;
///
/// assert_eq!(validate_city(" Москва ").unwrap(), "Москва");
/// assert!(validate_city("   ").is_err());
/// ```
pub fn validate_city(city: &str) -> ValidationResult<String> {
    let city = city.trim();

    if city.is_empty() {
        return Err(ValidationError::Required {
            field: "city".to_string(),
        });
    }

    if city.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "city".to_string(),
            max: 100,
        });
    }

    Ok(city.to_string())
}

/// Validates an email address and returns it trimmed and lowercased.
///
/// ## Rules
/// - Exactly one `@`, non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace, at most 254 characters
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing @"))?;

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("expected exactly one @ after a non-empty name"));
    }

    if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(email.to_lowercase())
}

/// Validates a password.
///
/// ## Rules
/// - At least [`MIN_PASSWORD_LEN`] characters
/// - At most 128 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    if len > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

// =============================================================================
// Listing Validators
// =============================================================================

/// Builds a [`PointFilter`], applying defaults and checking bounds.
///
/// ## Rules
/// - `page` defaults to 1 and must be ≥ 1
/// - `limit` defaults to [`DEFAULT_PAGE_LIMIT`] and must be in `1..=MAX_PAGE_LIMIT`
/// - `start` must not be after `end` when both are given
pub fn validate_point_filter(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    page: Option<u32>,
    limit: Option<u32>,
) -> ValidationResult<PointFilter> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::from(u32::MAX),
        });
    }

    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_LIMIT),
        });
    }

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "start_date".to_string(),
                reason: "must not be after end_date".to_string(),
            });
        }
    }

    Ok(PointFilter {
        start,
        end,
        page,
        limit,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
