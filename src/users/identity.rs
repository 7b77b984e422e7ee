//! Password hashing and verification.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Argon2, PasswordHash, PasswordVerifier};

use crate::error::UserError;

/// Seam for credential verification.
///
/// Keeps the hashing scheme out of the user store so it can be swapped (or
/// stubbed in tests) without touching registry logic.
pub trait IdentityVerifier: Send + Sync {
    /// Hash a cleartext password into a storable string.
    fn hash(&self, password: &str) -> Result<String, UserError>;

    /// Check a cleartext password against a stored hash.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}

/// Argon2id with per-password random salts, stored as PHC strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Verifier;

impl IdentityVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String, UserError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| UserError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
