// =====================================================================================
// PASSWORD SECURITY SERVICE - SECURE PASSWORD HANDLING
// =====================================================================================

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::instrument;

use crate::models::SecurityError;

pub struct PasswordSecurityService;

impl PasswordSecurityService {
    #[instrument(skip(password))]
    pub fn hash_password(password: &str) -> Result<String, SecurityError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SecurityError::PasswordHash(e.to_string()))?;
        Ok(password_hash.to_string())
    }

    #[instrument(skip(password, hash))]
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| SecurityError::PasswordHash(e.to_string()))?;
        let argon2 = Argon2::default();

        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(SecurityError::PasswordHash(e.to_string())),
        }
    }

    /// [`Self::hash_password`] on the blocking pool.
    pub async fn hash_password_async(password: String) -> Result<String, SecurityError> {
        tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(|e| SecurityError::ServiceError(e.to_string()))?
    }

    /// [`Self::verify_password`] on the blocking pool.
    pub async fn verify_password_async(password: String, hash: String) -> Result<bool, SecurityError> {
        tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash))
            .await
            .map_err(|e| SecurityError::ServiceError(e.to_string()))?
    }
}
