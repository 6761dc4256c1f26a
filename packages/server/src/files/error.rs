use thiserror::Error;
use uuid::Uuid;
use vaultbox_common::storage::StorageError;

/// Errors from a [`MetadataStore`](super::MetadataStore).
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("file record not found: {0}")]
    NotFound(Uuid),

    #[error("file record {id} is invalid: {reason}")]
    InvalidRow { id: Uuid, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Outcome taxonomy of [`FileService`](super::FileService) operations.
///
/// Messages may contain internal detail and are meant for logs; the HTTP
/// layer maps each variant to a fixed client-facing message.
#[derive(Debug, Error)]
pub enum FileError {
    /// Malformed or oversized input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Authenticated but not permitted.
    #[error("access denied")]
    Forbidden,

    #[error("file not found")]
    NotFound,

    /// Blob or metadata backend failure. Safe to retry.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Ciphertext, IV and key do not match. Never retried.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<MetadataError> for FileError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(_) => FileError::NotFound,
            other => FileError::Storage(other.to_string()),
        }
    }
}

// Blob keys stay out of the message; it ends up in logs.
impl From<StorageError> for FileError {
    fn from(err: StorageError) -> Self {
        let detail = match err {
            StorageError::NotFound(_) => "blob not found".to_string(),
            StorageError::Io(e) => format!("storage IO error: {}", e.kind()),
            StorageError::InvalidKey(_) => "invalid blob key".to_string(),
            StorageError::Backend(msg) => msg,
        };
        FileError::Storage(detail)
    }
}
