//! Password hashing using Argon2id
//!
//! Hashes are PHC strings, so verification reads its parameters from the
//! stored hash and keeps working after the configured costs change.
//!
//! # Example
//!
//! ```rust
//! use catalog_service::auth::PasswordHasher;
//! use catalog_service::config::PasswordConfig;
//!
//! let hasher = PasswordHasher::new(&PasswordConfig {
//!     memory_cost_kib: 1024,
//!     time_cost: 1,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let hash = hasher.hash("p").unwrap();
//! assert!(hasher.verify("p", &hash).unwrap());
//! assert!(!hasher.verify("q", &hash).unwrap());
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordConfig;
use crate::error::{Error, Result};

/// Argon2id hasher built from [`PasswordConfig`]
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl PasswordHasher {
    /// Build a hasher, rejecting cost parameters Argon2 does not accept
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| Error::Internal(format!("Invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            params,
            min_password_length: config.min_password_length,
        })
    }

    /// Hash a password into a PHC string with a fresh random salt
    ///
    /// # Errors
    ///
    /// A validation error on `password` when it is shorter than the configured
    /// minimum.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.chars().count() < self.min_password_length {
            return Err(Error::field(
                "password",
                format!(
                    "Password must be at least {} characters",
                    self.min_password_length
                ),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Internal(format!("Failed to hash password: {e}")))
    }

    /// Check a password against a stored hash in constant time
    ///
    /// Returns `Ok(false)` on mismatch and an error only when the stored hash
    /// is unreadable.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| Error::Internal(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!("Password verification failed: {e}"))),
        }
    }

    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordConfig {
        PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(&fast()).unwrap();
        let hash = hasher.hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(hasher.verify("correct horse", &hash).unwrap());
        assert!(!hasher.verify("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = PasswordHasher::new(&fast()).unwrap();
        let first = hasher.hash("p").unwrap();
        let second = hasher.hash("p").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("p", &second).unwrap());
    }

    #[test]
    fn test_min_length() {
        let hasher = PasswordHasher::new(&PasswordConfig {
            min_password_length: 8,
            ..fast()
        })
        .unwrap();

        match hasher.hash("short") {
            Err(Error::Validation { errors }) => {
                assert_eq!(errors["password"], "Password must be at least 8 characters");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(hasher.hash("long enough").is_ok());
    }

    #[test]
    fn test_verify_with_other_params() {
        let old = PasswordHasher::new(&fast()).unwrap();
        let hash = old.hash("p").unwrap();

        let new = PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 2048,
            ..fast()
        })
        .unwrap();
        assert!(new.verify("p", &hash).unwrap());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(PasswordHasher::new(&PasswordConfig {
            parallelism: 0,
            ..fast()
        })
        .is_err());

        let hasher = PasswordHasher::new(&fast()).unwrap();
        assert!(hasher.verify("p", "not_a_valid_hash").is_err());
    }
}
