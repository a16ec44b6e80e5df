//! # pvz-core: Pure Domain Model for the PVZ Backend
//!
//! This crate holds the types and rules of the pickup-point (PVZ) domain
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PVZ Backend Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pvz-service                                  │   │
//! │  │   access guard ──► managers ──► Transactor ──► repositories     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pvz-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────────┐  ┌───────────────────┐     │   │
//! │  │   │   types   │  │  validation    │  │      error        │     │   │
//! │  │   │  Point    │  │  city, email   │  │  ValidationError  │     │   │
//! │  │   │ Reception │  │  password      │  │                   │     │   │
//! │  │   │  Product  │  │  pagination    │  │                   │     │   │
//! │  │   └───────────┘  └────────────────┘  └───────────────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pvz-db (Database Layer)                      │   │
//! │  │        SQLite queries, migrations, repositories, Transactor     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Point, Reception, Product, User, ...)
//! - [`error`] - Validation error type
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use pvz_core::{ReceptionStatus, validation::validate_city};
//!
//! let city = validate_city("  Казань ").unwrap();
//! assert_eq!(city, "Казань");
//!
//! assert!(ReceptionStatus::Closed.allows_new_reception());
//! assert!(!ReceptionStatus::InProgress.allows_new_reception());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Cities a pickup point may be opened in.
///
/// The `cities` table seeded by the initial migration is the source of truth
/// at runtime; this list mirrors it for seeding and tests.
pub const KNOWN_CITIES: [&str; 3] = ["Москва", "Санкт-Петербург", "Казань"];

/// Email used for tokens issued by dummy login.
pub const DUMMY_EMAIL: &str = "dummyemail@google.com";

/// Default page size for point listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Maximum page size for point listings.
pub const MAX_PAGE_LIMIT: u32 = 30;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;
