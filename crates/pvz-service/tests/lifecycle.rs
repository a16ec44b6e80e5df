//! Reception and product lifecycle against a real SQLite file.

mod common;

use pvz_core::validation::validate_point_filter;
use pvz_core::{ProductType, ReceptionStatus, UserRole};
use pvz_service::{Entity, Operation, ServiceError, StateViolation};
use uuid::Uuid;

use common::{bearer, spawn_app};

fn assert_state(err: ServiceError, expected: StateViolation) {
    match err {
        ServiceError::InvalidState(violation) => assert_eq!(violation, expected),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_moscow_scenario() {
    let app = spawn_app().await;

    let point = app.points().create_point("Москва").await.unwrap();
    assert_eq!(point.city, "Москва");
    assert_ne!(point.id, Uuid::nil());

    let reception = app.receptions().open_reception(point.id).await.unwrap();
    assert_eq!(reception.status, ReceptionStatus::InProgress);

    let product = app
        .products()
        .add_product(point.id, ProductType::Electronics)
        .await
        .unwrap();
    assert_eq!(product.reception_id, reception.id);

    let closed = app.receptions().close_reception(point.id).await.unwrap();
    assert_eq!(closed.id, reception.id);
    assert_eq!(closed.status, ReceptionStatus::Closed);

    let err = app
        .products()
        .add_product(point.id, ProductType::Electronics)
        .await
        .unwrap_err();
    assert_state(err, StateViolation::ReceptionAlreadyClosed);
}

#[tokio::test]
async fn test_lifo_then_empty() {
    let app = spawn_app().await;
    let point = app.points().create_point("Казань").await.unwrap();
    app.receptions().open_reception(point.id).await.unwrap();

    let a = app.products().add_product(point.id, ProductType::Electronics).await.unwrap();
    let b = app.products().add_product(point.id, ProductType::Clothes).await.unwrap();
    let c = app.products().add_product(point.id, ProductType::Shoes).await.unwrap();

    for expected in [c, b, a] {
        let removed = app.products().delete_last_product(point.id).await.unwrap();
        assert_eq!(removed, expected);
    }

    let err = app.products().delete_last_product(point.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(Entity::Product)));
}

#[tokio::test]
async fn test_close_twice() {
    let app = spawn_app().await;
    let point = app.points().create_point("Санкт-Петербург").await.unwrap();

    app.receptions().open_reception(point.id).await.unwrap();
    app.products().add_product(point.id, ProductType::Shoes).await.unwrap();
    app.receptions().close_reception(point.id).await.unwrap();

    let err = app.receptions().close_reception(point.id).await.unwrap_err();
    assert_state(err, StateViolation::LastReceptionAlreadyClosed);
}

#[tokio::test]
async fn test_empty_close() {
    let app = spawn_app().await;
    let point = app.points().create_point("Москва").await.unwrap();
    app.receptions().open_reception(point.id).await.unwrap();

    let err = app.receptions().close_reception(point.id).await.unwrap_err();
    assert_state(err, StateViolation::CannotCloseEmptyReception);

    // The reception stays open
    app.products().add_product(point.id, ProductType::Clothes).await.unwrap();
}

#[tokio::test]
async fn test_product_ops_without_reception() {
    let app = spawn_app().await;
    let point = app.points().create_point("Москва").await.unwrap();

    let err = app
        .products()
        .add_product(point.id, ProductType::Shoes)
        .await
        .unwrap_err();
    assert_state(err, StateViolation::ReceptionAlreadyClosed);

    let err = app.products().delete_last_product(point.id).await.unwrap_err();
    assert_state(err, StateViolation::ReceptionAlreadyClosed);
}

#[tokio::test]
async fn test_unknown_point() {
    let app = spawn_app().await;
    let missing = Uuid::new_v4();

    assert!(matches!(
        app.receptions().open_reception(missing).await,
        Err(ServiceError::NotFound(Entity::Point))
    ));
    assert!(matches!(
        app.receptions().close_reception(missing).await,
        Err(ServiceError::NotFound(Entity::Point))
    ));
    assert!(matches!(
        app.products().add_product(missing, ProductType::Clothes).await,
        Err(ServiceError::NotFound(Entity::Point))
    ));
    assert!(matches!(
        app.products().delete_last_product(missing).await,
        Err(ServiceError::NotFound(Entity::Point))
    ));
}

#[tokio::test]
async fn test_full_info_after_two_receptions() {
    let app = spawn_app().await;
    let point = app.points().create_point("Казань").await.unwrap();

    app.receptions().open_reception(point.id).await.unwrap();
    app.products().add_product(point.id, ProductType::Electronics).await.unwrap();
    app.products().add_product(point.id, ProductType::Clothes).await.unwrap();
    app.receptions().close_reception(point.id).await.unwrap();

    app.receptions().open_reception(point.id).await.unwrap();
    app.products().add_product(point.id, ProductType::Shoes).await.unwrap();

    let infos = app.points().list_points_full_info().await.unwrap();
    assert_eq!(infos.len(), 1);

    let receptions = &infos[0].receptions;
    assert_eq!(receptions.len(), 2);
    assert_eq!(receptions[0].reception.status, ReceptionStatus::Closed);
    assert_eq!(receptions[0].products.len(), 2);
    assert_eq!(receptions[1].reception.status, ReceptionStatus::InProgress);
    assert_eq!(receptions[1].products[0].product_type, ProductType::Shoes);

    let page = validate_point_filter(None, None, Some(1), Some(10)).unwrap();
    let filtered = app.points().list_points_full_info_filtered(page).await.unwrap();
    assert_eq!(filtered, infos);
}

#[tokio::test]
async fn test_metrics_counted_once_per_call() {
    let app = spawn_app().await;
    let point = app.points().create_point("Москва").await.unwrap();
    let _ = app.points().create_point("Тверь").await;

    app.receptions().open_reception(point.id).await.unwrap();
    let _ = app.receptions().open_reception(point.id).await;
    app.products().add_product(point.id, ProductType::Clothes).await.unwrap();
    app.products().delete_last_product(point.id).await.unwrap();
    let _ = app.products().delete_last_product(point.id).await;
    let _ = app.receptions().close_reception(point.id).await;

    let metrics = app.metrics();
    assert_eq!(metrics.points_created.successes(), 1);
    assert_eq!(metrics.receptions_created.successes(), 1);
    assert_eq!(metrics.products_created.successes(), 1);
    assert_eq!(metrics.products_deleted.successes(), 1);
    assert_eq!(metrics.receptions_closed.successes(), 0);

    // Business rejections are not failures
    for counter in [
        &metrics.points_created,
        &metrics.receptions_created,
        &metrics.products_deleted,
    ] {
        assert_eq!(counter.errors(), 0);
    }

    // Closing an empty reception is a lifecycle failure
    assert_eq!(metrics.receptions_closed.errors(), 1);

    let text = metrics.gather_text().unwrap();
    assert!(text.contains("receptions_created_total 1"));
}

#[tokio::test]
async fn test_role_guard_matrix() {
    let app = spawn_app().await;
    let moderator = bearer(&app, UserRole::Moderator);
    let employee = bearer(&app, UserRole::Employee);

    assert!(app.authorize(Some(&moderator), Operation::CreatePoint).is_ok());
    assert!(matches!(
        app.authorize(Some(&employee), Operation::CreatePoint),
        Err(ServiceError::Forbidden)
    ));

    for operation in [
        Operation::OpenReception,
        Operation::CloseReception,
        Operation::AddProduct,
        Operation::DeleteProduct,
    ] {
        assert!(app.authorize(Some(&employee), operation).is_ok());
        assert!(matches!(
            app.authorize(Some(&moderator), operation),
            Err(ServiceError::Forbidden)
        ));
    }

    assert!(app.authorize(Some(&employee), Operation::ListPoints).is_ok());
    assert!(app.authorize(Some(&moderator), Operation::ListPoints).is_ok());
    assert!(matches!(
        app.authorize(None, Operation::ListPoints),
        Err(ServiceError::InvalidAccessToken)
    ));
}
