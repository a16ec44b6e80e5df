//! # Product Repository
//!
//! Database operations for products accepted into a reception.
//!
//! Products of a reception form a stack: [`ProductRepository::delete_most_recent`]
//! always removes the one with the highest `seq`.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pvz_core::{Product, ProductType};

/// Repository for product database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductRepository;

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new() -> Self {
        ProductRepository
    }

    /// Inserts a product under the given reception.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        reception_id: Uuid,
        product_type: ProductType,
    ) -> DbResult<Product> {
        let product = Product {
            id: Uuid::new_v4(),
            reception_id,
            product_type,
            created_at: Utc::now(),
        };
        debug!(id = %product.id, reception_id = %reception_id, kind = %product_type, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, reception_id, type, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(product.id)
        .bind(product.reception_id)
        .bind(product.product_type)
        .bind(product.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Lists a reception's products in insertion order.
    pub async fn list_by_reception(
        &self,
        conn: &mut SqliteConnection,
        reception_id: Uuid,
    ) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, reception_id, type, created_at
            FROM products
            WHERE reception_id = ?1
            ORDER BY seq ASC
            "#,
        )
        .bind(reception_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(products)
    }

    /// Deletes the most recently inserted product of the reception.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The removed product
    /// * `Err(DbError::NotFound { entity: "Product", .. })` - Reception has no products
    pub async fn delete_most_recent(
        &self,
        conn: &mut SqliteConnection,
        reception_id: Uuid,
    ) -> DbResult<Product> {
        let newest = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, reception_id, type, created_at
            FROM products
            WHERE reception_id = ?1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", reception_id))?;

        debug!(id = %newest.id, reception_id = %reception_id, "Deleting most recent product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(newest.id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", newest.id));
        }

        Ok(newest)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_lifo_deletion() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let point = db.points().create(&mut conn, "Казань").await.unwrap();
        let reception = db.receptions().open(&mut conn, point.id).await.unwrap();
        let repo = db.products();

        let a = repo.insert(&mut conn, reception.id, ProductType::Electronics).await.unwrap();
        let b = repo.insert(&mut conn, reception.id, ProductType::Clothes).await.unwrap();
        let c = repo.insert(&mut conn, reception.id, ProductType::Shoes).await.unwrap();

        let listed = repo.list_by_reception(&mut conn, reception.id).await.unwrap();
        assert_eq!(listed, vec![a.clone(), b.clone(), c.clone()]);

        assert_eq!(repo.delete_most_recent(&mut conn, reception.id).await.unwrap().id, c.id);
        assert_eq!(repo.delete_most_recent(&mut conn, reception.id).await.unwrap().id, b.id);
        assert_eq!(repo.delete_most_recent(&mut conn, reception.id).await.unwrap().id, a.id);

        let err = repo.delete_most_recent(&mut conn, reception.id).await.unwrap_err();
        assert!(err.is_not_found("Product"));
    }

    #[tokio::test]
    async fn test_insert_requires_existing_reception() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = db
            .products()
            .insert(&mut conn, Uuid::new_v4(), ProductType::Shoes)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
