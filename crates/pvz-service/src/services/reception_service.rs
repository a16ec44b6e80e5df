//! Reception lifecycle.
//!
//! A point has at most one `in_progress` reception, and it is always the
//! latest one. Opening requires the latest reception to be closed (or none to
//! exist); closing requires it to be open and non-empty.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use pvz_core::{Reception, ReceptionStatus};
use pvz_db::{DbError, PointRepository, ReceptionRepository, Transactor};

use crate::error::{Entity, ServiceError, ServiceResult, StateViolation};
use crate::metrics::ServiceMetrics;

/// Opens and closes receptions.
#[derive(Clone)]
pub struct ReceptionService {
    transactor: Transactor,
    points: PointRepository,
    receptions: ReceptionRepository,
    metrics: Arc<ServiceMetrics>,
}

impl ReceptionService {
    pub fn new(
        transactor: Transactor,
        points: PointRepository,
        receptions: ReceptionRepository,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        ReceptionService {
            transactor,
            points,
            receptions,
            metrics,
        }
    }

    /// Opens a new reception at the point.
    ///
    /// ## Errors
    /// * `NotFound(Point)` - Unknown point
    /// * `InvalidState(LastReceptionNotClosed)` - Latest reception still in progress
    pub async fn open_reception(&self, point_id: Uuid) -> ServiceResult<Reception> {
        let points = self.points;
        let receptions = self.receptions;

        let result: ServiceResult<Reception> = self
            .transactor
            .run(move |conn| {
                Box::pin(async move {
                    points
                        .lock(conn, point_id)
                        .await
                        .map_err(|e| ServiceError::missing(e, Entity::Point))?;

                    let latest = receptions.latest_status(conn, point_id).await?;
                    if !ReceptionStatus::effective(latest).allows_new_reception() {
                        return Err(StateViolation::LastReceptionNotClosed.into());
                    }

                    receptions.open(conn, point_id).await.map_err(|e| match e {
                        // The partial unique index caught a concurrent open
                        DbError::UniqueViolation { .. } => {
                            ServiceError::from(StateViolation::LastReceptionNotClosed)
                        }
                        other => ServiceError::Infrastructure(other),
                    })
                })
            })
            .await;

        self.metrics
            .receptions_created
            .observe_with(&result, ServiceError::is_expected_lifecycle_rejection);
        match &result {
            Ok(reception) => info!(point_id = %point_id, reception_id = %reception.id, "Reception opened"),
            Err(e) => e.report("open_reception"),
        }
        result
    }

    /// Closes the point's latest reception and returns it.
    ///
    /// ## Errors
    /// * `NotFound(Point)` - Unknown point
    /// * `InvalidState(LastReceptionAlreadyClosed)` - Nothing in progress
    /// * `InvalidState(CannotCloseEmptyReception)` - No products accepted yet
    /// * `NotFound(Reception)` - Latest reception changed under the update
    pub async fn close_reception(&self, point_id: Uuid) -> ServiceResult<Reception> {
        let points = self.points;
        let receptions = self.receptions;

        let result: ServiceResult<Reception> = self
            .transactor
            .run(move |conn| {
                Box::pin(async move {
                    points
                        .lock(conn, point_id)
                        .await
                        .map_err(|e| ServiceError::missing(e, Entity::Point))?;

                    let latest = receptions.latest_status(conn, point_id).await?;
                    if ReceptionStatus::effective(latest) == ReceptionStatus::Closed {
                        return Err(StateViolation::LastReceptionAlreadyClosed.into());
                    }

                    if receptions.count_products_in_latest(conn, point_id).await? == 0 {
                        return Err(StateViolation::CannotCloseEmptyReception.into());
                    }

                    receptions
                        .close_latest(conn, point_id)
                        .await
                        .map_err(|e| ServiceError::missing(e, Entity::Reception))
                })
            })
            .await;

        self.metrics
            .receptions_closed
            .observe_with(&result, ServiceError::is_expected_lifecycle_rejection);
        match &result {
            Ok(reception) => info!(point_id = %point_id, reception_id = %reception.id, "Reception closed"),
            Err(e) => e.report("close_reception"),
        }
        result
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pvz_core::ProductType;
    use pvz_db::{Database, DbConfig, TransactorConfig};

    async fn setup() -> (Database, ReceptionService, Uuid) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = ReceptionService::new(
            Transactor::new(db.pool().clone(), TransactorConfig::default()),
            db.points(),
            db.receptions(),
            Arc::new(ServiceMetrics::new().unwrap()),
        );

        let mut conn = db.pool().acquire().await.unwrap();
        let point = db.points().create(&mut conn, "Казань").await.unwrap();

        (db, service, point.id)
    }

    async fn add_product(db: &Database, reception_id: Uuid) {
        let mut conn = db.pool().acquire().await.unwrap();
        db.products()
            .insert(&mut conn, reception_id, ProductType::Shoes)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_then_open_again() {
        let (_db, service, point_id) = setup().await;

        let reception = service.open_reception(point_id).await.unwrap();
        assert_eq!(reception.point_id, point_id);
        assert_eq!(reception.status, ReceptionStatus::InProgress);

        let err = service.open_reception(point_id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState(StateViolation::LastReceptionNotClosed)
        ));
        assert_eq!(service.metrics.receptions_created.successes(), 1);
        assert_eq!(service.metrics.receptions_created.errors(), 0);
    }

    #[tokio::test]
    async fn test_open_unknown_point() {
        let (_db, service, _) = setup().await;

        let err = service.open_reception(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Point)));

        let err = service.close_reception(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Point)));
        assert_eq!(service.metrics.receptions_created.errors(), 0);
        assert_eq!(service.metrics.receptions_closed.errors(), 0);
    }

    #[tokio::test]
    async fn test_close_lifecycle() {
        let (db, service, point_id) = setup().await;

        let err = service.close_reception(point_id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState(StateViolation::LastReceptionAlreadyClosed)
        ));

        let reception = service.open_reception(point_id).await.unwrap();
        let err = service.close_reception(point_id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState(StateViolation::CannotCloseEmptyReception)
        ));

        add_product(&db, reception.id).await;
        let closed = service.close_reception(point_id).await.unwrap();
        assert_eq!(closed.id, reception.id);
        assert_eq!(closed.status, ReceptionStatus::Closed);

        // Reopen after close is allowed
        let next = service.open_reception(point_id).await.unwrap();
        assert_ne!(next.id, reception.id);
        assert_eq!(service.metrics.receptions_closed.successes(), 1);
        // Closing with nothing in progress and closing an empty reception
        assert_eq!(service.metrics.receptions_closed.errors(), 2);
    }
}
