//! JWT authentication module.
//!
//! Issues and validates access/refresh token pairs. Access and refresh tokens
//! are signed with different secrets and carry a `token_type` claim, so one
//! can never stand in for the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use pvz_core::UserRole;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

impl Claims {
    /// Parses the subject as a user id.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Access and refresh token issued together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    access_secret: String,
    refresh_secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .field("refresh_lifetime_secs", &self.refresh_lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(
        access_secret: String,
        refresh_secret: String,
        access_lifetime_secs: i64,
        refresh_lifetime_secs: i64,
    ) -> Self {
        JwtManager {
            access_secret,
            refresh_secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    /// Generate an access token.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> ServiceResult<String> {
        self.sign(user_id, email, role, ACCESS)
    }

    /// Generate a refresh token.
    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> ServiceResult<String> {
        self.sign(user_id, email, role, REFRESH)
    }

    /// Generate both tokens for one identity.
    pub fn generate_pair(&self, user_id: Uuid, email: &str, role: UserRole) -> ServiceResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user_id, email, role)?,
            refresh_token: self.generate_refresh_token(user_id, email, role)?,
        })
    }

    /// Validate that a token is an unexpired access token.
    pub fn validate_access_token(&self, token: &str) -> ServiceResult<Claims> {
        match self.validate(token, &self.access_secret, ACCESS) {
            Some(claims) => Ok(claims),
            None => Err(ServiceError::InvalidAccessToken),
        }
    }

    /// Validate that a token is an unexpired refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> ServiceResult<Claims> {
        match self.validate(token, &self.refresh_secret, REFRESH) {
            Some(claims) => Ok(claims),
            None => Err(ServiceError::InvalidRefreshToken),
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    fn sign(&self, user_id: Uuid, email: &str, role: UserRole, token_type: &str) -> ServiceResult<String> {
        let (secret, lifetime) = match token_type {
            ACCESS => (&self.access_secret, self.access_lifetime_secs),
            _ => (&self.refresh_secret, self.refresh_lifetime_secs),
        };

        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Token(format!("Failed to generate {} token: {}", token_type, e)))
    }

    fn validate(&self, token: &str, secret: &str, expected_type: &str) -> Option<Claims> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| tracing::debug!(error = %e, expected_type, "Token rejected"))
        .ok()?;

        if token_data.claims.token_type != expected_type {
            tracing::debug!(expected_type, "Token has wrong type");
            return None;
        }

        Some(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
