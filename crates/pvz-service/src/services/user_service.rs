//! Identity and sessions.
//!
//! Each user stores at most one refresh token: the latest one issued.
//! Presenting any other refresh token (an older, rotated one) is rejected.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use pvz_core::validation::{validate_email, validate_password};
use pvz_core::{User, UserRole, DUMMY_EMAIL};
use pvz_db::{DbError, Transactor, UserRepository};

use crate::auth::{Claims, JwtManager, TokenPair};
use crate::error::{Entity, ServiceError, ServiceResult};
use crate::hasher::Argon2Hasher;

/// Registers users and issues tokens.
#[derive(Clone)]
pub struct UserService {
    transactor: Transactor,
    users: UserRepository,
    jwt: Arc<JwtManager>,
    hasher: Arc<Argon2Hasher>,
}

impl UserService {
    pub fn new(
        transactor: Transactor,
        users: UserRepository,
        jwt: Arc<JwtManager>,
        hasher: Arc<Argon2Hasher>,
    ) -> Self {
        UserService {
            transactor,
            users,
            jwt,
            hasher,
        }
    }

    /// Token pair for a synthetic identity; nothing is stored.
    pub fn dummy_login(&self, role: UserRole) -> ServiceResult<TokenPair> {
        let tokens = self.jwt.generate_pair(Uuid::nil(), DUMMY_EMAIL, role)?;
        info!(role = %role, "Issued dummy login tokens");
        Ok(tokens)
    }

    /// Registers a user and returns their first token pair.
    ///
    /// ## Errors
    /// * `Validation` - Malformed email or short password
    /// * `UserAlreadyExists` - Email taken
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> ServiceResult<TokenPair> {
        let result = self.register_inner(email, password, role).await;
        match &result {
            Ok(_) => info!(email = %email, role = %role, "User registered"),
            Err(e) => e.report("register"),
        }
        result
    }

    async fn register_inner(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> ServiceResult<TokenPair> {
        let email = validate_email(email)?;
        validate_password(password)?;

        let password_hash = self.hasher.hash_blocking(password).await?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        let tokens = self.jwt.generate_pair(id, &email, role)?;

        let user = User {
            id,
            email,
            password_hash,
            role,
            refresh_token: Some(tokens.refresh_token.clone()),
            created_at: now,
            updated_at: now,
        };

        let users = self.users;
        self.transactor
            .run(move |conn| {
                let user = user.clone();
                Box::pin(async move {
                    if users.get_by_email(conn, &user.email).await?.is_some() {
                        return Err(ServiceError::UserAlreadyExists);
                    }

                    users.create(conn, &user).await.map_err(|e| match e {
                        DbError::UniqueViolation { .. } => ServiceError::UserAlreadyExists,
                        other => ServiceError::Infrastructure(other),
                    })
                })
            })
            .await?;

        Ok(tokens)
    }

    /// Checks credentials and rotates the stored refresh token.
    ///
    /// ## Errors
    /// * `NotFound(User)` - No user with this email
    /// * `InvalidCredentials` - Wrong password
    /// * `Hashing` - Stored password hash is corrupt
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<TokenPair> {
        let result = self.authenticate_inner(email, password).await;
        match &result {
            Ok(_) => info!(email = %email, "User authenticated"),
            Err(e) => e.report("authenticate"),
        }
        result
    }

    async fn authenticate_inner(&self, email: &str, password: &str) -> ServiceResult<TokenPair> {
        let email = email.trim().to_lowercase();
        let users = self.users;

        let user = self
            .transactor
            .run(move |conn| {
                let email = email.clone();
                Box::pin(async move {
                    users
                        .get_by_email(conn, &email)
                        .await?
                        .ok_or(ServiceError::NotFound(Entity::User))
                })
            })
            .await?;

        if !self.hasher.verify_blocking(password, &user.password_hash).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        let tokens = self.jwt.generate_pair(user.id, &user.email, user.role)?;
        self.store_refresh_token(user.id, Some(tokens.refresh_token.clone()))
            .await?;

        Ok(tokens)
    }

    /// Exchanges the current refresh token for a new pair.
    ///
    /// ## Errors
    /// * `InvalidRefreshToken` - Bad signature, expired, wrong type, or not the
    ///   latest token issued to the user
    /// * `NotFound(User)` - Subject no longer exists
    pub async fn refresh_tokens(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        let result = self.refresh_inner(refresh_token).await;
        match &result {
            Ok(_) => info!("Tokens refreshed"),
            Err(e) => e.report("refresh_tokens"),
        }
        result
    }

    async fn refresh_inner(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;
        let user_id = claims.user_id().ok_or(ServiceError::InvalidRefreshToken)?;

        let users = self.users;
        let jwt = Arc::clone(&self.jwt);
        let presented = refresh_token.to_string();

        self.transactor
            .run(move |conn| {
                let jwt = Arc::clone(&jwt);
                let presented = presented.clone();
                Box::pin(async move {
                    let user = users
                        .get_by_id(conn, user_id)
                        .await?
                        .ok_or(ServiceError::NotFound(Entity::User))?;

                    if user.refresh_token.as_deref() != Some(presented.as_str()) {
                        debug!(user_id = %user_id, "Refresh token is not the latest issued");
                        return Err(ServiceError::InvalidRefreshToken);
                    }

                    let tokens = jwt.generate_pair(user.id, &user.email, user.role)?;
                    users
                        .update_refresh_token(conn, user.id, Some(tokens.refresh_token.as_str()))
                        .await?;

                    Ok(tokens)
                })
            })
            .await
    }

    /// Clears the stored refresh token.
    ///
    /// ## Errors
    /// * `NotFound(User)` - Unknown user
    pub async fn logout(&self, user_id: Uuid) -> ServiceResult<()> {
        let result = self.store_refresh_token(user_id, None).await;
        match &result {
            Ok(()) => info!(user_id = %user_id, "User logged out"),
            Err(e) => e.report("logout"),
        }
        result
    }

    /// Validates an access token and returns its claims.
    pub fn validate_access_token(&self, token: &str) -> ServiceResult<Claims> {
        self.jwt.validate_access_token(token)
    }

    async fn store_refresh_token(&self, user_id: Uuid, token: Option<String>) -> ServiceResult<()> {
        let users = self.users;

        self.transactor
            .run(move |conn| {
                let token = token.clone();
                Box::pin(async move {
                    users
                        .update_refresh_token(conn, user_id, token.as_deref())
                        .await
                        .map_err(|e| ServiceError::missing(e, Entity::User))
                })
            })
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
