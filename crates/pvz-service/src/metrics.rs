//! Prometheus counters for the business operations.
//!
//! Every mutating call increments exactly one counter of its pair:
//!
//! - `<operation>_total` on success
//! - `<operation>_errors` on infrastructure/internal failure
//!
//! Business rejections (not found, invalid state, validation) increment
//! neither. The reception counters are stricter: only the two routine
//! lifecycle rejections are left uncounted, see
//! [`ServiceError::is_expected_lifecycle_rejection`].

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::error::{ServiceError, ServiceResult};

/// Success/error counter pair for one operation.
#[derive(Clone)]
pub struct OutcomeCounter {
    ok: IntCounter,
    err: IntCounter,
}

impl OutcomeCounter {
    fn register(registry: &Registry, name: &str, help: &str) -> ServiceResult<Self> {
        let ok = IntCounter::new(format!("{}_total", name), format!("Total {}", help))
            .map_err(metrics_error)?;
        let err = IntCounter::new(format!("{}_errors", name), format!("Failed attempts: {}", help))
            .map_err(metrics_error)?;

        registry.register(Box::new(ok.clone())).map_err(metrics_error)?;
        registry.register(Box::new(err.clone())).map_err(metrics_error)?;

        Ok(OutcomeCounter { ok, err })
    }

    /// Counts the outcome of one call. Business rejections are not errors.
    pub fn observe<T>(&self, result: &ServiceResult<T>) {
        self.observe_with(result, ServiceError::is_business_rejection);
    }

    /// Counts the outcome of one call, skipping failures `expected` accepts.
    pub fn observe_with<T>(&self, result: &ServiceResult<T>, expected: fn(&ServiceError) -> bool) {
        match result {
            Ok(_) => self.ok.inc(),
            Err(e) if !expected(e) => self.err.inc(),
            Err(_) => {}
        }
    }

    pub fn successes(&self) -> u64 {
        self.ok.get()
    }

    pub fn errors(&self) -> u64 {
        self.err.get()
    }
}

/// All service counters, registered in a registry owned by this value.
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,
    pub receptions_created: OutcomeCounter,
    pub receptions_closed: OutcomeCounter,
    pub products_created: OutcomeCounter,
    pub products_deleted: OutcomeCounter,
    pub points_created: OutcomeCounter,
}

impl ServiceMetrics {
    /// Creates and registers every counter.
    pub fn new() -> ServiceResult<Self> {
        let registry = Registry::new();

        Ok(ServiceMetrics {
            receptions_created: OutcomeCounter::register(
                &registry,
                "receptions_created",
                "receptions opened",
            )?,
            receptions_closed: OutcomeCounter::register(
                &registry,
                "receptions_closed",
                "receptions closed",
            )?,
            products_created: OutcomeCounter::register(
                &registry,
                "products_created",
                "products accepted",
            )?,
            products_deleted: OutcomeCounter::register(
                &registry,
                "products_deleted",
                "products withdrawn",
            )?,
            points_created: OutcomeCounter::register(&registry, "points_created", "points created")?,
            registry,
        })
    }

    /// Encode all metrics as Prometheus text format.
    pub fn gather_text(&self) -> ServiceResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(metrics_error)
    }
}

fn metrics_error(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Metrics(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Entity, StateViolation};
    use pvz_db::DbError;

    #[test]
    fn test_observe_policy() {
        let metrics = ServiceMetrics::new().unwrap();
        let counter = &metrics.receptions_created;

        counter.observe(&Ok(()));
        counter.observe::<()>(&Err(StateViolation::LastReceptionNotClosed.into()));
        counter.observe::<()>(&Err(ServiceError::NotFound(Entity::Point)));
        counter.observe::<()>(&Err(ServiceError::Infrastructure(DbError::PoolExhausted)));

        assert_eq!(counter.successes(), 1);
        assert_eq!(counter.errors(), 1);
    }

    #[test]
    fn test_observe_lifecycle_policy() {
        let metrics = ServiceMetrics::new().unwrap();
        let counter = &metrics.receptions_closed;
        let expected = ServiceError::is_expected_lifecycle_rejection;

        counter.observe_with::<()>(&Err(ServiceError::NotFound(Entity::Point)), expected);
        counter.observe_with::<()>(&Err(StateViolation::LastReceptionNotClosed.into()), expected);
        assert_eq!(counter.errors(), 0);

        counter.observe_with::<()>(&Err(StateViolation::LastReceptionAlreadyClosed.into()), expected);
        counter.observe_with::<()>(&Err(StateViolation::CannotCloseEmptyReception.into()), expected);
        counter.observe_with::<()>(&Err(ServiceError::NotFound(Entity::Reception)), expected);
        assert_eq!(counter.errors(), 3);
        assert_eq!(counter.successes(), 0);
    }

    #[test]
    fn test_independent_registries() {
        // Each instance owns its registry, so two can coexist
        let a = ServiceMetrics::new().unwrap();
        let b = ServiceMetrics::new().unwrap();

        a.points_created.observe(&Ok(()));
        assert_eq!(a.points_created.successes(), 1);
        assert_eq!(b.points_created.successes(), 0);
    }

    #[test]
    fn test_gather_text() {
        let metrics = ServiceMetrics::new().unwrap();
        metrics.products_deleted.observe(&Ok(()));

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("products_deleted_total 1"));
        assert!(text.contains("receptions_closed_errors 0"));
    }
}
