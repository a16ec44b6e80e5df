//! # Repository Module
//!
//! Database repository implementations for the PVZ backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories on a Borrowed Connection                │
//! │                                                                         │
//! │  Service                                                               │
//! │       │                                                                 │
//! │       │  transactor.run(|conn| ... )                                   │
//! │       ▼                                                                 │
//! │  ┌─────────────── one transaction ───────────────┐                     │
//! │  │ points.lock(conn, point_id)                    │  write lock first  │
//! │  │ receptions.latest_status(conn, point_id)       │  check             │
//! │  │ products.insert(conn, reception_id, kind)      │  act               │
//! │  └────────────────────────────────────────────────┘                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repositories are stateless `Copy` handles. Every method takes the     │
//! │  caller's `&mut SqliteConnection`, so the whole check-then-act         │
//! │  sequence shares a single transaction.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PointRepository`](point::PointRepository) - Points, city allow-list, row lock
//! - [`ReceptionRepository`](reception::ReceptionRepository) - Receptions per point
//! - [`ProductRepository`](product::ProductRepository) - Products per reception (LIFO)
//! - [`UserRepository`](user::UserRepository) - Accounts and refresh tokens

pub mod point;
pub mod product;
pub mod reception;
pub mod user;
