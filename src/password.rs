//! Password hashing with Argon2id.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::error::ServiceError;

/// Salted, adaptive one-way hasher. The cost parameters are the library
/// defaults and cannot be tuned by callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password into a PHC string. Every call draws a fresh salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashingFailure(e.to_string()))
    }

    /// Check a plaintext against a stored hash. A mismatch, or a stored value that
    /// is not a PHC string, is `false` rather than an error.
    pub fn verify(&self, hashed: &str, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// `hash`, run on tokio's blocking pool.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, ServiceError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| ServiceError::HashingFailure(e.to_string()))?
    }

    /// `verify` on the blocking pool. A task that fails to complete counts as a
    /// mismatch.
    pub async fn verify_blocking(&self, hashed: String, plaintext: String) -> bool {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&hashed, &plaintext))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "password verification task failed");
                false
            })
    }
}
