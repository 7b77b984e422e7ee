//! Blob store abstraction.
//!
//! The application treats object storage as an external key/value blob
//! service: objects are addressed by filename, with no per-user namespace.
//! Ownership is tracked in the user store, not here, so identically named
//! uploads from different users land on the same key.
//!
//! # Usage
//!
//! ```ignore
//! use photobin::store::{BlobStore, S3BlobStore, Visibility};
//!
//! let store = S3BlobStore::new(client, "my-bucket".to_string());
//! store.put("cat.jpg", bytes, "image/jpeg").await?;
//! store.set_visibility("cat.jpg", Visibility::Private).await?;
//! let data = store.get("cat.jpg").await?;
//! ```

mod s3;

pub use s3::{create_s3_client, S3BlobStore};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// Access level for a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Object is readable by anyone with the URL
    Public,
    /// Object is only readable through the application
    Private,
}

/// External blob storage, keyed by filename.
///
/// Implementations must be cheap to clone or shared behind `Arc`; handlers
/// call them concurrently. No retries are performed at this layer.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Fetch the full object under `key`.
    ///
    /// Fails with [`StoreError::NotFound`] when the key is absent.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Check whether an object exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove the object under `key`.
    ///
    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List all keys ending in one of `suffixes` (case-insensitive).
    async fn list_suffix(&self, suffixes: &[&str]) -> Result<Vec<String>, StoreError>;

    /// Toggle public/private access on an existing object.
    async fn set_visibility(&self, key: &str, visibility: Visibility) -> Result<(), StoreError>;
}

/// Check if a key has one of the given suffixes, ignoring case.
pub(crate) fn key_has_suffix(key: &str, suffixes: &[&str]) -> bool {
    let key_lower = key.to_lowercase();
    suffixes.iter().any(|s| key_lower.ends_with(s))
}
