//! Point registry and full-info listings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use pvz_core::validation::validate_city;
use pvz_core::{Point, PointFilter, PointFullInfo, ReceptionWithProducts};
use pvz_db::{
    DbResult, PointRepository, ProductRepository, ReceptionRepository, SqliteConnection,
    Transactor,
};

use crate::error::{Entity, ServiceError, ServiceResult};
use crate::metrics::ServiceMetrics;

/// Creates and lists points.
#[derive(Clone)]
pub struct PointService {
    transactor: Transactor,
    points: PointRepository,
    receptions: ReceptionRepository,
    products: ProductRepository,
    metrics: Arc<ServiceMetrics>,
}

impl PointService {
    pub fn new(
        transactor: Transactor,
        points: PointRepository,
        receptions: ReceptionRepository,
        products: ProductRepository,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        PointService {
            transactor,
            points,
            receptions,
            products,
            metrics,
        }
    }

    /// Creates a point in an allow-listed city.
    ///
    /// ## Errors
    /// * `Validation` - Empty or oversized city name
    /// * `NotFound(City)` - City is not served
    pub async fn create_point(&self, city: &str) -> ServiceResult<Point> {
        let result = match validate_city(city) {
            Ok(city) => {
                let points = self.points;
                self.transactor
                    .run(move |conn| {
                        let city = city.clone();
                        Box::pin(async move {
                            points
                                .create(conn, &city)
                                .await
                                .map_err(|e| ServiceError::missing(e, Entity::City))
                        })
                    })
                    .await
            }
            Err(e) => Err(ServiceError::Validation(e)),
        };

        self.metrics.points_created.observe(&result);
        match &result {
            Ok(point) => info!(point_id = %point.id, city = %point.city, "Point created"),
            Err(e) => e.report("create_point"),
        }
        result
    }

    /// All points in creation order.
    pub async fn list_points(&self) -> ServiceResult<Vec<Point>> {
        let points = self.points;

        self.transactor
            .run(move |conn| Box::pin(async move { Ok::<_, ServiceError>(points.list_all(conn).await?) }))
            .await
            .map_err(|e| {
                e.report("list_points");
                e
            })
    }

    /// Every point with its receptions and their products, all in creation order.
    pub async fn list_points_full_info(&self) -> ServiceResult<Vec<PointFullInfo>> {
        let points = self.points;
        let receptions = self.receptions;
        let products = self.products;

        self.transactor
            .run(move |conn| {
                Box::pin(async move {
                    let listed = points.list_all(conn).await?;
                    Ok::<_, ServiceError>(
                        assemble(receptions, products, conn, listed, None, None).await?,
                    )
                })
            })
            .await
            .map_err(|e| {
                e.report("list_points_full_info");
                e
            })
    }

    /// One page of points with their receptions, restricted to receptions
    /// created inside the filter's window when one is given.
    ///
    /// With a window, points having no reception inside it are left out.
    pub async fn list_points_full_info_filtered(
        &self,
        filter: PointFilter,
    ) -> ServiceResult<Vec<PointFullInfo>> {
        let points = self.points;
        let receptions = self.receptions;
        let products = self.products;

        let result = self
            .transactor
            .run(move |conn| {
                Box::pin(async move {
                    let page = points.list_page(conn, &filter).await?;
                    Ok::<_, ServiceError>(
                        assemble(receptions, products, conn, page, filter.start, filter.end)
                            .await?,
                    )
                })
            })
            .await;

        match &result {
            Ok(page) => debug!(page = filter.page, limit = filter.limit, returned = page.len(), "Listed points page"),
            Err(e) => e.report("list_points_full_info_filtered"),
        }
        result
    }
}

/// Attaches receptions (optionally windowed) and their products to each point.
async fn assemble(
    receptions: ReceptionRepository,
    products: ProductRepository,
    conn: &mut SqliteConnection,
    points: Vec<Point>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> DbResult<Vec<PointFullInfo>> {
    let mut infos = Vec::with_capacity(points.len());

    for point in points {
        let listed = receptions.list_by_point(conn, point.id, start, end).await?;

        let mut detailed = Vec::with_capacity(listed.len());
        for reception in listed {
            let items = products.list_by_reception(conn, reception.id).await?;
            detailed.push(ReceptionWithProducts {
                reception,
                products: items,
            });
        }

        infos.push(PointFullInfo {
            point,
            receptions: detailed,
        });
    }

    Ok(infos)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pvz_core::validation::validate_point_filter;
    use pvz_core::ProductType;
    use pvz_db::{Database, DbConfig, TransactorConfig};

    async fn setup() -> (Database, PointService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = PointService::new(
            Transactor::new(db.pool().clone(), TransactorConfig::default()),
            db.points(),
            db.receptions(),
            db.products(),
            Arc::new(ServiceMetrics::new().unwrap()),
        );
        (db, service)
    }

    #[tokio::test]
    async fn test_create_point() {
        let (_db, service) = setup().await;

        let point = service.create_point("  Москва ").await.unwrap();
        assert_eq!(point.city, "Москва");

        let err = service.create_point("Новосибирск").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Entity::City)));

        let err = service.create_point("   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert_eq!(service.metrics.points_created.successes(), 1);
        assert_eq!(service.metrics.points_created.errors(), 0);
    }

    #[tokio::test]
    async fn test_list_points_in_creation_order() {
        let (_db, service) = setup().await;

        let first = service.create_point("Казань").await.unwrap();
        let second = service.create_point("Москва").await.unwrap();

        let listed = service.list_points().await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn test_full_info_nesting() {
        let (db, service) = setup().await;
        let point = service.create_point("Санкт-Петербург").await.unwrap();
        let empty = service.create_point("Казань").await.unwrap();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            let reception = db.receptions().open(&mut conn, point.id).await.unwrap();
            db.products().insert(&mut conn, reception.id, ProductType::Clothes).await.unwrap();
            db.products().insert(&mut conn, reception.id, ProductType::Shoes).await.unwrap();
        }

        let infos = service.list_points_full_info().await.unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].point.id, point.id);
        assert_eq!(infos[0].receptions.len(), 1);
        let kinds: Vec<_> = infos[0].receptions[0]
            .products
            .iter()
            .map(|p| p.product_type)
            .collect();
        assert_eq!(kinds, vec![ProductType::Clothes, ProductType::Shoes]);
        assert_eq!(infos[1].point.id, empty.id);
        assert!(infos[1].receptions.is_empty());
    }

    #[tokio::test]
    async fn test_filtered_window_and_paging() {
        let (db, service) = setup().await;
        let with_reception = service.create_point("Москва").await.unwrap();
        let _without = service.create_point("Казань").await.unwrap();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            db.receptions().open(&mut conn, with_reception.id).await.unwrap();
        }

        let window = validate_point_filter(
            Some(Utc::now() - chrono::Duration::hours(1)),
            Some(Utc::now() + chrono::Duration::hours(1)),
            None,
            None,
        )
        .unwrap();
        let infos = service.list_points_full_info_filtered(window).await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].point.id, with_reception.id);

        let stale = validate_point_filter(
            Some(Utc::now() - chrono::Duration::days(2)),
            Some(Utc::now() - chrono::Duration::days(1)),
            None,
            None,
        )
        .unwrap();
        assert!(service.list_points_full_info_filtered(stale).await.unwrap().is_empty());

        let second_page = validate_point_filter(None, None, Some(2), Some(1)).unwrap();
        let infos = service.list_points_full_info_filtered(second_page).await.unwrap();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].receptions.is_empty());
    }
}
