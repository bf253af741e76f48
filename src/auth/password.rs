use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

use crate::config::HasherConfig;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid hasher parameters: {0}")]
    Params(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("hashing task failed: {0}")]
    Task(String),
}

pub trait PasswordHasher: Send + Sync {
    /// Hash with a fresh random salt; equal passwords give different strings.
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// False for a wrong password and for a stored hash that cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id producing PHC strings.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(config: &HasherConfig) -> Result<Self, HashError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| HashError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::new(&HasherConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_verify_accepts_own_hash() {
        let hasher = hasher();
        for password in ["pw1", "", "correct horse battery staple", "pässwörd"] {
            let hash = hasher.hash(password).unwrap();
            assert!(hasher.verify(password, &hash), "{password}");
        }
    }

    #[test]
    fn test_verify_rejects_other_password() {
        let hasher = hasher();
        let hash = hasher.hash("pw1").unwrap();
        assert!(!hasher.verify("pw2", &hash));
        assert!(!hasher.verify("PW1", &hash));
    }

    #[test]
    fn test_same_password_gets_fresh_salt() {
        let hasher = hasher();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        let hasher = hasher();
        assert!(!hasher.verify("pw", "not-a-phc-string"));
        assert!(!hasher.verify("pw", ""));
    }

    #[test]
    fn test_hash_from_other_params_still_verifies() {
        let strong = Argon2Hasher::new(&HasherConfig {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash("pw").unwrap();
        assert!(hasher().verify("pw", &hash));
    }

    #[test]
    fn test_rejects_bad_params() {
        let result = Argon2Hasher::new(&HasherConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(HashError::Params(_))));
    }
}
