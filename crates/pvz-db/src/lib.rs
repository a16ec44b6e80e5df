//! # pvz-db: Database Layer for the PVZ Backend
//!
//! This crate provides database access for the PVZ backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PVZ Data Flow                                    │
//! │                                                                         │
//! │  ReceptionService::open_reception(point_id)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pvz-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  Transactor   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │(transaction.rs│    │ (point.rs ..) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ BEGIN         │    │ PointRepo     │    │ 001_init.sql │  │   │
//! │  │   │ work(&mut tx) │───►│ ReceptionRepo │    │              │  │   │
//! │  │   │ COMMIT/retry  │    │ ProductRepo   │    │              │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ Database (pool.rs): SqlitePool, WAL, busy timeout  │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (pvz.db)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`transaction`] - Transaction coordinator with bounded lock retry
//! - [`repository`] - Repository implementations (point, reception, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pvz_db::{Database, DbConfig, DbError, Transactor, TransactorConfig};
//!
//! let db = Database::new(DbConfig::new("pvz.db")).await?;
//! let tx = Transactor::new(db.pool().clone(), TransactorConfig::default());
//! let points = db.points();
//!
//! let point = tx
//!     .run(move |conn| Box::pin(async move { points.create(conn, "Казань").await }))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod transaction;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use transaction::{Retryable, Transactor, TransactorConfig};

// Repository re-exports for convenience
pub use repository::point::PointRepository;
pub use repository::product::ProductRepository;
pub use repository::reception::ReceptionRepository;
pub use repository::user::UserRepository;

/// Connection type every repository method runs on.
pub use sqlx::SqliteConnection;
