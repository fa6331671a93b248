//! One-way password hashing (argon2id) off the async executor.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

use quillpost_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("invalid hashing cost: {0}")]
    InvalidCost(String),

    #[error("hashing failed: {0}")]
    Hash(String),

    #[error("hashing worker failed: {0}")]
    Worker(String),
}

impl From<PasswordError> for DomainError {
    fn from(err: PasswordError) -> Self {
        DomainError::internal(err.to_string())
    }
}

/// Argon2 work factor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub lanes: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            lanes: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes and verifies secrets. Cheap to clone.
///
/// Each digest is a PHC string with its own random salt, so hashing the same
/// secret twice never yields the same digest.
#[derive(Debug, Clone)]
pub struct PasswordStore {
    params: Params,
}

impl PasswordStore {
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.lanes, None)
            .map_err(|e| PasswordError::InvalidCost(e.to_string()))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash on the calling thread. Prefer [`PasswordStore::hash`] from async code.
    pub fn hash_blocking(&self, secret: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Verify on the calling thread. A digest that does not parse never matches.
    pub fn verify_blocking(&self, secret: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("stored password digest is unreadable: {e}");
                return false;
            }
        };
        self.hasher()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    pub async fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let store = self.clone();
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || store.hash_blocking(&secret))
            .await
            .map_err(|e| PasswordError::Worker(e.to_string()))?
    }

    pub async fn verify(&self, secret: &str, digest: &str) -> bool {
        let store = self.clone();
        let secret = secret.to_owned();
        let digest = digest.to_owned();
        match tokio::task::spawn_blocking(move || store.verify_blocking(&secret, &digest)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!("password verification worker failed: {e}");
                false
            }
        }
    }
}
