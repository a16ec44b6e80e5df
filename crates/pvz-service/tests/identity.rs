//! Registration, login and refresh-token rotation.

mod common;

use pvz_core::UserRole;
use pvz_service::{ApiError, Entity, ErrorCode, Operation, ServiceError};

use common::spawn_app;

#[tokio::test]
async fn test_duplicate_register() {
    let app = spawn_app().await;

    app.users()
        .register("kladovshik@pvz.ru", "secret1", UserRole::Employee)
        .await
        .unwrap();

    let err = app
        .users()
        .register("kladovshik@pvz.ru", "secret2", UserRole::Moderator)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UserAlreadyExists));

    let api: ApiError = err.into();
    assert_eq!(api.code, ErrorCode::Conflict);
    assert_eq!(api.http_status(), 409);
}

#[tokio::test]
async fn test_registered_token_passes_guard() {
    let app = spawn_app().await;

    let tokens = app
        .users()
        .register("moderator@pvz.ru", "secret1", UserRole::Moderator)
        .await
        .unwrap();

    let claims = app
        .authorize(Some(&tokens.access_token), Operation::CreatePoint)
        .unwrap();
    assert_eq!(claims.email, "moderator@pvz.ru");
}

#[tokio::test]
async fn test_refresh_rotation_rejects_reuse() {
    let app = spawn_app().await;

    let first = app
        .users()
        .register("worker@pvz.ru", "secret1", UserRole::Employee)
        .await
        .unwrap();

    let second = app.users().refresh_tokens(&first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);

    let err = app.users().refresh_tokens(&first.refresh_token).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRefreshToken));

    // The rotated token still works
    app.users().refresh_tokens(&second.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_login_rotates_refresh_token() {
    let app = spawn_app().await;

    let registered = app
        .users()
        .register("worker@pvz.ru", "secret1", UserRole::Employee)
        .await
        .unwrap();
    let logged_in = app.users().authenticate("worker@pvz.ru", "secret1").await.unwrap();

    assert!(matches!(
        app.users().refresh_tokens(&registered.refresh_token).await,
        Err(ServiceError::InvalidRefreshToken)
    ));
    app.users().refresh_tokens(&logged_in.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_logout_invalidates_refresh() {
    let app = spawn_app().await;

    let tokens = app
        .users()
        .register("worker@pvz.ru", "secret1", UserRole::Employee)
        .await
        .unwrap();
    let claims = app.users().validate_access_token(&tokens.access_token).unwrap();

    app.users().logout(claims.user_id().unwrap()).await.unwrap();

    assert!(matches!(
        app.users().refresh_tokens(&tokens.refresh_token).await,
        Err(ServiceError::InvalidRefreshToken)
    ));
}

#[tokio::test]
async fn test_dummy_refresh_has_no_user() {
    let app = spawn_app().await;

    let tokens = app.users().dummy_login(UserRole::Employee).unwrap();
    let err = app.users().refresh_tokens(&tokens.refresh_token).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(Entity::User)));
}

#[tokio::test]
async fn test_garbage_refresh_token() {
    let app = spawn_app().await;

    let err = app.users().refresh_tokens("garbage").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRefreshToken));
}
