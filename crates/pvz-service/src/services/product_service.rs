//! Product accumulation under the open reception.
//!
//! Products are withdrawn strictly last-in-first-out.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use pvz_core::{Product, ProductType, Reception};
use pvz_db::{
    PointRepository, ProductRepository, ReceptionRepository, SqliteConnection, Transactor,
};

use crate::error::{Entity, ServiceError, ServiceResult, StateViolation};
use crate::metrics::ServiceMetrics;

/// Adds and withdraws products.
#[derive(Clone)]
pub struct ProductService {
    transactor: Transactor,
    points: PointRepository,
    receptions: ReceptionRepository,
    products: ProductRepository,
    metrics: Arc<ServiceMetrics>,
}

/// Locks the point and returns its latest reception if it is still open.
async fn open_reception_of(
    points: PointRepository,
    receptions: ReceptionRepository,
    conn: &mut SqliteConnection,
    point_id: Uuid,
) -> ServiceResult<Reception> {
    points
        .lock(conn, point_id)
        .await
        .map_err(|e| ServiceError::missing(e, Entity::Point))?;

    match receptions.latest(conn, point_id).await? {
        Some(reception) if reception.status.accepts_products() => Ok(reception),
        _ => Err(StateViolation::ReceptionAlreadyClosed.into()),
    }
}

impl ProductService {
    pub fn new(
        transactor: Transactor,
        points: PointRepository,
        receptions: ReceptionRepository,
        products: ProductRepository,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        ProductService {
            transactor,
            points,
            receptions,
            products,
            metrics,
        }
    }

    /// Adds a product to the point's open reception.
    ///
    /// ## Errors
    /// * `NotFound(Point)` - Unknown point
    /// * `InvalidState(ReceptionAlreadyClosed)` - No reception in progress
    pub async fn add_product(
        &self,
        point_id: Uuid,
        product_type: ProductType,
    ) -> ServiceResult<Product> {
        let points = self.points;
        let receptions = self.receptions;
        let products = self.products;

        let result: ServiceResult<Product> = self
            .transactor
            .run(move |conn| {
                Box::pin(async move {
                    let reception = open_reception_of(points, receptions, conn, point_id).await?;
                    let product = products.insert(conn, reception.id, product_type).await?;
                    Ok::<_, ServiceError>(product)
                })
            })
            .await;

        self.metrics.products_created.observe(&result);
        match &result {
            Ok(product) => info!(
                point_id = %point_id,
                reception_id = %product.reception_id,
                product_id = %product.id,
                kind = %product.product_type,
                "Product added"
            ),
            Err(e) => e.report("add_product"),
        }
        result
    }

    /// Withdraws the most recently added product of the open reception.
    ///
    /// ## Errors
    /// * `NotFound(Point)` - Unknown point
    /// * `InvalidState(ReceptionAlreadyClosed)` - No reception in progress
    /// * `NotFound(Product)` - Open reception is empty
    pub async fn delete_last_product(&self, point_id: Uuid) -> ServiceResult<Product> {
        let points = self.points;
        let receptions = self.receptions;
        let products = self.products;

        let result: ServiceResult<Product> = self
            .transactor
            .run(move |conn| {
                Box::pin(async move {
                    let reception = open_reception_of(points, receptions, conn, point_id).await?;
                    products
                        .delete_most_recent(conn, reception.id)
                        .await
                        .map_err(|e| ServiceError::missing(e, Entity::Product))
                })
            })
            .await;

        self.metrics.products_deleted.observe(&result);
        match &result {
            Ok(product) => info!(point_id = %point_id, product_id = %product.id, "Product withdrawn"),
            Err(e) => e.report("delete_last_product"),
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
    use pvz_db::{Database, DbConfig, TransactorConfig};

    async fn setup() -> (Database, ProductService, Uuid) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = ProductService::new(
            Transactor::new(db.pool().clone(), TransactorConfig::default()),
            db.points(),
            db.receptions(),
            db.products(),
            Arc::new(ServiceMetrics::new().unwrap()),
        );

        let mut conn = db.pool().acquire().await.unwrap();
        let point = db.points().create(&mut conn, "Москва").await.unwrap();

        (db, service, point.id)
    }

    async fn open(db: &Database, point_id: Uuid) -> Reception {
        let mut conn = db.pool().acquire().await.unwrap();
        db.receptions().open(&mut conn, point_id).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_without_reception() {
        let (_db, service, point_id) = setup().await;

        let err = service
            .add_product(point_id, ProductType::Electronics)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState(StateViolation::ReceptionAlreadyClosed)
        ));
        assert_eq!(service.metrics.products_created.errors(), 0);
    }

    #[tokio::test]
    async fn test_add_to_unknown_point() {
        let (_db, service, _) = setup().await;

        let err = service
            .add_product(Uuid::new_v4(), ProductType::Clothes)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Point)));
    }

    #[tokio::test]
    async fn test_lifo_withdrawal() {
        let (db, service, point_id) = setup().await;
        let reception = open(&db, point_id).await;

        let a = service.add_product(point_id, ProductType::Electronics).await.unwrap();
        let b = service.add_product(point_id, ProductType::Clothes).await.unwrap();
        assert_eq!(a.reception_id, reception.id);

        let removed = service.delete_last_product(point_id).await.unwrap();
        assert_eq!(removed.id, b.id);

        let removed = service.delete_last_product(point_id).await.unwrap();
        assert_eq!(removed.id, a.id);

        let err = service.delete_last_product(point_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::Product)));

        assert_eq!(service.metrics.products_created.successes(), 2);
        assert_eq!(service.metrics.products_deleted.successes(), 2);
        assert_eq!(service.metrics.products_deleted.errors(), 0);
    }
}
