//! # pvz-service: Business Services for the PVZ Backend
//!
//! Reception lifecycle, product accumulation, point registry, identity,
//! role guard and operation counters, on top of [`pvz_db`].
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  credentials ──► App::authorize(.., Operation) ──► Claims / Forbidden   │
//! │                                                                         │
//! │  ReceptionService::open_reception(point_id)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Transactor::run ── BEGIN                                               │
//! │       │             lock point row        (NotFound(Point))            │
//! │       │             latest status         (LastReceptionNotClosed)     │
//! │       │             insert reception                                    │
//! │       │           COMMIT  (retry on SQLITE_BUSY, bounded)               │
//! │       ▼                                                                 │
//! │  ServiceMetrics ── receptions_created_total / _errors                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`app`] - Wiring from [`AppConfig`] to services
//! - [`services`] - Point, reception, product and user services
//! - [`auth`] - JWT access/refresh tokens
//! - [`hasher`] - Argon2id password hashing
//! - [`access`] - Role policy per operation
//! - [`metrics`] - Prometheus counters
//! - [`config`] - Environment configuration
//! - [`error`] - Service and API errors
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pvz_service::{telemetry, App, AppConfig, Operation};
//!
//! telemetry::init_tracing();
//! let app = App::build(AppConfig::load()?).await?;
//!
//! app.authorize(Some(header), Operation::OpenReception)?;
//! let reception = app.receptions().open_reception(point_id).await?;
//! ```

pub mod access;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod hasher;
pub mod metrics;
pub mod services;
pub mod telemetry;

pub use access::{authorize, AccessPolicy, Operation};
pub use app::App;
pub use auth::{extract_bearer_token, Claims, JwtManager, TokenPair};
pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, Entity, ErrorCode, ServiceError, ServiceResult, StateViolation};
pub use hasher::Argon2Hasher;
pub use metrics::{OutcomeCounter, ServiceMetrics};
pub use services::{PointService, ProductService, ReceptionService, UserService};
