//! # Transaction Coordinator
//!
//! Runs a unit of work inside one SQLite transaction, retrying lock conflicts.
//!
//! ## Attempt Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Transactor::run(work)                              │
//! │                                                                         │
//! │   attempt 1..=max_attempts                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   BEGIN ──► work(&mut conn) ──┬── Ok  ──► COMMIT ──► return Ok         │
//! │                               │                                         │
//! │                               └── Err ──► ROLLBACK                     │
//! │                                              │                          │
//! │                          ┌───────────────────┴──────────┐              │
//! │                          ▼                              ▼              │
//! │                 retryable (Busy) and              anything else        │
//! │                 attempts left                     return Err           │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 sleep(next backoff) ──► next attempt                   │
//! │                                                                         │
//! │   Deadline (optional): the whole attempt runs under tokio timeout.     │
//! │   Timing out or dropping the future drops the transaction → rollback.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! Lifecycle operations start with a write to the point row
//! ([`PointRepository::lock`](crate::PointRepository::lock)), so the
//! transaction holds SQLite's write lock before it reads anything. Concurrent
//! writers wait on the busy timeout and, if it elapses, surface
//! [`DbError::Busy`], which is the only error retried here.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures_util::future::BoxFuture;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbError;

// =============================================================================
// Retry Classification
// =============================================================================

/// Errors that can tell the coordinator whether another attempt may succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for DbError {
    fn is_retryable(&self) -> bool {
        self.is_busy()
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Retry and deadline settings for [`Transactor`].
#[derive(Debug, Clone)]
pub struct TransactorConfig {
    /// Total attempts, including the first. Default: 5
    pub max_attempts: u32,

    /// First backoff delay. Default: 10 ms
    pub initial_backoff: Duration,

    /// Backoff ceiling. Default: 500 ms
    pub max_backoff: Duration,

    /// Per-attempt deadline. Default: none
    pub timeout: Option<Duration>,
}

impl Default for TransactorConfig {
    fn default() -> Self {
        TransactorConfig {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(500),
            timeout: None,
        }
    }
}

impl TransactorConfig {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }
}

// =============================================================================
// Transactor
// =============================================================================

/// Executes closures inside a database transaction.
///
/// ## Example
/// ```rust,ignore
/// let receptions = db.receptions();
/// let status = transactor
///     .run(move |conn| Box::pin(async move { receptions.latest_status(conn, point_id).await }))
///     .await?;
/// ```
///
/// The closure is called once per attempt, so it must be `FnMut` and
/// capture only cheap, clonable state.
#[derive(Debug, Clone)]
pub struct Transactor {
    pool: SqlitePool,
    config: TransactorConfig,
}

impl Transactor {
    pub fn new(pool: SqlitePool, config: TransactorConfig) -> Self {
        Transactor { pool, config }
    }

    pub fn config(&self) -> &TransactorConfig {
        &self.config
    }

    /// Runs `work` in a transaction. Commits on `Ok`, rolls back on `Err`.
    ///
    /// Retryable errors (lock conflicts) start a fresh attempt after a
    /// backoff delay, up to `max_attempts` in total.
    pub async fn run<T, E, F>(&self, mut work: F) -> Result<T, E>
    where
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>> + Send,
        E: From<DbError> + Retryable + Send,
        T: Send,
    {
        let mut backoff = self.create_backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = match self.config.timeout {
                Some(limit) => match tokio::time::timeout(limit, self.attempt(&mut work)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(timeout_ms = limit.as_millis() as u64, "Transaction deadline exceeded, rolled back");
                        Err(E::from(DbError::Timeout(limit.as_millis())))
                    }
                },
                None => self.attempt(&mut work).await,
            };

            match result {
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = backoff.next_backoff().unwrap_or(self.config.max_backoff);
                    warn!(attempt, ?delay, "Lock conflict, retrying transaction");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(attempts = attempt, "Lock conflict persisted, giving up");
                    }
                    return Err(err);
                }
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempts = attempt, "Transaction committed after retry");
                    }
                    return Ok(value);
                }
            }
        }
    }

    /// One BEGIN .. COMMIT/ROLLBACK round.
    async fn attempt<T, E, F>(&self, work: &mut F) -> Result<T, E>
    where
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>> + Send,
        E: From<DbError> + Retryable + Send,
        T: Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| E::from(DbError::from(e)))?;

        match work(&mut *tx).await {
            Ok(value) => {
                tx.commit().await.map_err(|e| E::from(DbError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed, connection will be reset");
                }
                Err(err)
            }
        }
    }

    /// Creates the exponential backoff configuration.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_interval: self.config.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
