//! Application bootstrap.
//!
//! Wires configuration into the database, transactor, metrics and services.

use std::sync::Arc;

use tracing::info;

use pvz_db::{Database, Transactor};

use crate::access::{authorize, Operation};
use crate::auth::{Claims, JwtManager};
use crate::config::AppConfig;
use crate::error::ServiceResult;
use crate::hasher::Argon2Hasher;
use crate::metrics::ServiceMetrics;
use crate::services::{PointService, ProductService, ReceptionService, UserService};

/// Fully wired application.
pub struct App {
    db: Database,
    jwt: Arc<JwtManager>,
    metrics: Arc<ServiceMetrics>,
    points: PointService,
    receptions: ReceptionService,
    products: ProductService,
    users: UserService,
}

impl App {
    /// Opens the database (running migrations) and builds every service.
    pub async fn build(config: AppConfig) -> ServiceResult<Self> {
        info!(path = %config.database_path.display(), "Building PVZ backend");

        let db = Database::new(config.db_config()).await?;
        let transactor = Transactor::new(db.pool().clone(), config.transactor_config());

        let metrics = Arc::new(ServiceMetrics::new()?);
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.refresh_secret.clone(),
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        ));
        let hasher = Arc::new(Argon2Hasher::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
        )?);

        let points = PointService::new(
            transactor.clone(),
            db.points(),
            db.receptions(),
            db.products(),
            Arc::clone(&metrics),
        );
        let receptions = ReceptionService::new(
            transactor.clone(),
            db.points(),
            db.receptions(),
            Arc::clone(&metrics),
        );
        let products = ProductService::new(
            transactor.clone(),
            db.points(),
            db.receptions(),
            db.products(),
            Arc::clone(&metrics),
        );
        let users = UserService::new(transactor, db.users(), Arc::clone(&jwt), hasher);

        info!("PVZ backend ready");

        Ok(App {
            db,
            jwt,
            metrics,
            points,
            receptions,
            products,
            users,
        })
    }

    pub fn points(&self) -> &PointService {
        &self.points
    }

    pub fn receptions(&self) -> &ReceptionService {
        &self.receptions
    }

    pub fn products(&self) -> &ProductService {
        &self.products
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn metrics(&self) -> &ServiceMetrics {
        &self.metrics
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checks the caller may perform `operation`.
    ///
    /// `credentials` is an `Authorization` header value or a bare access token.
    pub fn authorize(&self, credentials: Option<&str>, operation: Operation) -> ServiceResult<Claims> {
        authorize(&self.jwt, credentials, operation.policy())
    }

    /// Closes the connection pool.
    pub async fn shutdown(&self) {
        info!("Shutting down PVZ backend");
        self.db.close().await;
    }
}
