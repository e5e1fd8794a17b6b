//! Password hashing utilities using Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Trait for password hashing operations
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a password with a fresh random salt
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Verify a password against a hash
    ///
    /// Any failure, including a hash that cannot be parsed, is reported as
    /// `PasswordMismatch`.
    fn verify(&self, password: &str, hash: &str) -> Result<(), DomainError>;
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Argon2id password hasher
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a hasher with argon2's recommended cost
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Create a hasher with explicit cost parameters
    pub fn with_config(config: PasswordHashConfig) -> Result<Self, DomainError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| DomainError::configuration(format!("Invalid argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::hashing(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<(), DomainError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| DomainError::PasswordMismatch)?;

        // Cost parameters are read from the stored hash itself
        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| DomainError::PasswordMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::with_config(PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "my_secure_password";

        let hash = hasher.hash(password).unwrap();

        assert!(hasher.verify(password, &hash).is_ok());
        assert!(matches!(
            hasher.verify("wrong_password", &hash),
            Err(DomainError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_hash_is_unique() {
        let hasher = fast_hasher();
        let password = "my_secure_password";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // Random salt
        assert_ne!(hash1, hash2);

        assert!(hasher.verify(password, &hash1).is_ok());
        assert!(hasher.verify(password, &hash2).is_ok());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = fast_hasher();

        assert!(matches!(
            hasher.verify("password", "invalid_hash_format"),
            Err(DomainError::PasswordMismatch)
        ));
        assert!(matches!(
            hasher.verify("password", ""),
            Err(DomainError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_hash_is_argon2id() {
        let hash = fast_hasher().hash("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret1"));
    }

    #[test]
    fn test_default_cost_is_not_minimum() {
        let config = PasswordHashConfig::default();
        assert!(config.memory_kib > Params::MIN_M_COST);
        assert!(config.iterations > Params::MIN_T_COST);
    }

    #[test]
    fn test_hash_verifies_across_cost_settings() {
        let hash = fast_hasher().hash("secret1").unwrap();
        assert!(Argon2Hasher::new().verify("secret1", &hash).is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let result = Argon2Hasher::with_config(PasswordHashConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        });
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
