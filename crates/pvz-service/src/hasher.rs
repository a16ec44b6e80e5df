//! Password hashing with Argon2id.

use std::sync::Arc;

use argon2::{
    password_hash::{self, rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use tokio::task;

use crate::error::{ServiceError, ServiceResult};

/// Hashes and verifies passwords as PHC strings.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Creates a hasher with the given memory (KiB) and time costs.
    pub fn new(memory_kib: u32, iterations: u32) -> ServiceResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| ServiceError::Hashing(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Argon2Hasher { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password for storage.
    pub fn hash(&self, password: &str) -> ServiceResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ServiceError::Hashing(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against its stored hash.
    ///
    /// ## Returns
    /// * `Ok(true)` - Password matches
    /// * `Ok(false)` - Password does not match
    /// * `Err(ServiceError::Hashing)` - Stored hash is not a valid PHC string
    pub fn verify(&self, password: &str, hash: &str) -> ServiceResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| ServiceError::Hashing(format!("Malformed password hash: {}", e)))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ServiceError::Hashing(format!("Failed to verify password: {}", e))),
        }
    }

    /// [`hash`](Self::hash) on the blocking thread pool.
    pub async fn hash_blocking(self: &Arc<Self>, password: &str) -> ServiceResult<String> {
        let hasher = Arc::clone(self);
        let password = password.to_string();

        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(join_error)?
    }

    /// [`verify`](Self::verify) on the blocking thread pool.
    pub async fn verify_blocking(self: &Arc<Self>, password: &str, hash: &str) -> ServiceResult<bool> {
        let hasher = Arc::clone(self);
        let password = password.to_string();
        let hash = hash.to_string();

        task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(join_error)?
    }
}

fn join_error(e: task::JoinError) -> ServiceError {
    ServiceError::Hashing(format!("Hashing task failed: {}", e))
}
