//! Password hashing and verification.
//!
//! Uses Argon2id with per-user salts. The verifier is a capability
//! trait so the session authenticator never depends on the concrete
//! algorithm; salts and hashes are opaque strings end to end.

use argon2::password_hash::{Output, PasswordHash, PasswordHasher, Salt, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use thiserror::Error;

/// Password hashing errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Stored salt is not valid B64.
    #[error("invalid salt format")]
    InvalidSalt,
}

/// Capability for hashing and verifying passwords.
///
/// `verify` returns a bare bool: the caller decides how a mismatch is
/// surfaced, and no detail about the stored material leaks through the
/// error channel.
pub trait PasswordVerifier: Send + Sync {
    /// Generate a fresh random salt.
    fn generate_salt(&self) -> String;

    /// Hash a password with the given salt.
    fn hash(&self, password: &str, salt: &str) -> Result<String, PasswordError>;

    /// Check a candidate password against stored material.
    fn verify(&self, salt: &str, candidate: &str, stored_hash: &str) -> bool;
}

/// Argon2id implementation of [`PasswordVerifier`].
///
/// Uses the crate's default parameters (Argon2id v19, m=19456, t=2, p=1,
/// the OWASP-recommended profile).
#[derive(Debug, Default)]
pub struct Argon2Scheme;

impl Argon2Scheme {
    pub fn new() -> Self {
        Self
    }

    fn hash_inner(&self, password: &str, salt: &str) -> Result<String, PasswordError> {
        let salt = Salt::from_b64(salt).map_err(|_| PasswordError::InvalidSalt)?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(hash.to_string())
    }
}

impl PasswordVerifier for Argon2Scheme {
    fn generate_salt(&self) -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    fn hash(&self, password: &str, salt: &str) -> Result<String, PasswordError> {
        self.hash_inner(password, salt)
    }

    fn verify(&self, salt: &str, candidate: &str, stored_hash: &str) -> bool {
        let computed = match self.hash_inner(candidate, salt) {
            Ok(h) => h,
            Err(_) => return false,
        };

        // Compare digests, not PHC strings: Output's PartialEq is
        // constant-time.
        fn digest(phc: &str) -> Option<Output> {
            PasswordHash::new(phc).ok()?.hash
        }
        match (digest(stored_hash), digest(&computed)) {
            (Some(stored), Some(computed)) => stored == computed,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_formatted() {
        let scheme = Argon2Scheme::new();
        let salt = scheme.generate_salt();
        let hash = scheme.hash("secret123", &salt).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("$v=19$"));
    }

    #[test]
    fn test_same_salt_same_hash() {
        let scheme = Argon2Scheme::new();
        let salt = scheme.generate_salt();

        let h1 = scheme.hash("secret123", &salt).unwrap();
        let h2 = scheme.hash("secret123", &salt).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_fresh_salts_differ() {
        let scheme = Argon2Scheme::new();
        let s1 = scheme.generate_salt();
        let s2 = scheme.generate_salt();
        assert_ne!(s1, s2);

        let h1 = scheme.hash("secret123", &s1).unwrap();
        let h2 = scheme.hash("secret123", &s2).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_verify_correct_password() {
        let scheme = Argon2Scheme::new();
        let salt = scheme.generate_salt();
        let hash = scheme.hash("secret123", &salt).unwrap();

        assert!(scheme.verify(&salt, "secret123", &hash));
    }

    #[test]
    fn test_verify_wrong_password() {
        let scheme = Argon2Scheme::new();
        let salt = scheme.generate_salt();
        let hash = scheme.hash("secret123", &salt).unwrap();

        assert!(!scheme.verify(&salt, "wrong", &hash));
    }

    #[test]
    fn test_verify_garbage_stored_hash() {
        let scheme = Argon2Scheme::new();
        let salt = scheme.generate_salt();

        assert!(!scheme.verify(&salt, "secret123", "not-a-phc-string"));
    }

    #[test]
    fn test_verify_garbage_salt() {
        let scheme = Argon2Scheme::new();
        let salt = scheme.generate_salt();
        let hash = scheme.hash("secret123", &salt).unwrap();

        assert!(!scheme.verify("!!!", "secret123", &hash));
    }

    #[test]
    fn test_invalid_salt_error() {
        let scheme = Argon2Scheme::new();
        let result = scheme.hash("secret123", "!!!");
        assert!(matches!(result, Err(PasswordError::InvalidSalt)));
    }

    #[test]
    fn test_unicode_password() {
        let scheme = Argon2Scheme::new();
        let salt = scheme.generate_salt();
        let hash = scheme.hash("密码パスワード", &salt).unwrap();
        assert!(scheme.verify(&salt, "密码パスワード", &hash));
    }
}
