//! User accounts and file ownership.
//!
//! The user store is the application's only durable-looking state that does
//! not live in the blob store: who exists, and which filenames each account
//! owns. It is a seam trait so the in-memory registry can be replaced by a
//! database-backed implementation without touching handlers.
//!
//! Ownership is authoritative here, not in the blob store: a file is visible
//! to a user only if its name appears in that user's list.

mod identity;

pub use identity::{Argon2Verifier, IdentityVerifier};

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::UserError;

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    /// Account identifier (the email address)
    pub email: String,

    /// Argon2 PHC-encoded password hash
    pub password_hash: String,

    /// Filenames owned by this account, in upload order
    pub files: Vec<String>,
}

/// Persistence seam for accounts and ownership.
///
/// All mutation paths go through this trait; handlers never reach into user
/// state directly.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a new account with an empty file list.
    ///
    /// Fails with [`UserError::DuplicateUser`] when the email is taken;
    /// the existing account is left untouched.
    async fn create(&self, email: &str, password: &str) -> Result<(), UserError>;

    /// Check credentials for signin.
    ///
    /// Fails with [`UserError::InvalidCredentials`] on unknown email or
    /// password mismatch, without distinguishing the two.
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<(), UserError>;

    /// Whether an account exists for `email`.
    async fn exists(&self, email: &str) -> bool;

    /// The account's owned filenames, in upload order.
    ///
    /// Unknown accounts yield an empty list.
    async fn files(&self, email: &str) -> Vec<String>;

    /// Whether `email` owns `filename`.
    async fn owns(&self, email: &str, filename: &str) -> bool;

    /// Append `filename` to the account's ownership list.
    ///
    /// Called only after the blob write has succeeded, so a failed upload
    /// never leaves a dangling reference. Re-uploading an owned filename is
    /// a no-op on the list.
    async fn record_file(&self, email: &str, filename: &str) -> Result<(), UserError>;

    /// Remove `filename` from the account's ownership list.
    async fn forget_file(&self, email: &str, filename: &str);
}

/// In-process implementation of [`UserStore`].
///
/// State is held behind a `tokio::sync::RwLock` and is lost on restart.
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
    verifier: Box<dyn IdentityVerifier>,
}

impl MemoryUserStore {
    /// Create an empty store with the given password verifier.
    pub fn new(verifier: Box<dyn IdentityVerifier>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            verifier,
        }
    }

    /// Number of registered accounts.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether no accounts are registered.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new(Box::new(Argon2Verifier))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password: &str) -> Result<(), UserError> {
        // Hash outside the lock; argon2 is deliberately slow
        let password_hash = self.verifier.hash(password)?;

        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(UserError::DuplicateUser(email.to_string()));
        }

        users.insert(
            email.to_string(),
            User {
                email: email.to_string(),
                password_hash,
                files: Vec::new(),
            },
        );

        Ok(())
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<(), UserError> {
        let stored_hash = {
            let users = self.users.read().await;
            match users.get(email) {
                Some(user) => user.password_hash.clone(),
                None => return Err(UserError::InvalidCredentials),
            }
        };

        if self.verifier.verify(password, &stored_hash) {
            Ok(())
        } else {
            Err(UserError::InvalidCredentials)
        }
    }

    async fn exists(&self, email: &str) -> bool {
        self.users.read().await.contains_key(email)
    }

    async fn files(&self, email: &str) -> Vec<String> {
        self.users
            .read()
            .await
            .get(email)
            .map(|u| u.files.clone())
            .unwrap_or_default()
    }

    async fn owns(&self, email: &str, filename: &str) -> bool {
        self.users
            .read()
            .await
            .get(email)
            .map(|u| u.files.iter().any(|f| f == filename))
            .unwrap_or(false)
    }

    async fn record_file(&self, email: &str, filename: &str) -> Result<(), UserError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(email)
            .ok_or(UserError::InvalidCredentials)?;

        if !user.files.iter().any(|f| f == filename) {
            user.files.push(filename.to_string());
        }

        Ok(())
    }

    async fn forget_file(&self, email: &str, filename: &str) {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(email) {
            user.files.retain(|f| f != filename);
        }
    }
}
