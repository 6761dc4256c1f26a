use async_trait::async_trait;

use super::error::StorageError;
use super::key::BlobKey;

/// Key-addressed blob storage.
///
/// Implementations do not retry; transient failures surface as
/// [`StorageError`] and the caller decides what to do.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, replacing any existing blob.
    async fn put(&self, key: &BlobKey, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError>;

    /// Delete a blob.
    ///
    /// Returns [`StorageError::NotFound`] if no blob exists under `key`.
    async fn delete(&self, key: &BlobKey) -> Result<(), StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;
}
