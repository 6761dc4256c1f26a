use std::sync::Arc;

use axum::http::HeaderValue;
use chrono::Utc;
use mime_guess::Mime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use vaultbox_common::storage::{BlobKey, BlobStore, StorageError};
use vaultbox_common::{Cipher, CipherError};

use crate::utils::filename::validate_display_name;

use super::error::FileError;
use super::metadata::MetadataStore;
use super::policy::{Action, authorize};
use super::record::{DownloadedFile, FileView, NewFileRecord, NewUpload, Principal, Visibility};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Coordinates the blob store, the metadata store and the cipher.
///
/// Every operation writes the blob before the record and removes the blob
/// before the record, so a crash between the two steps never leaves a record
/// pointing at a missing blob.
#[derive(Clone)]
pub struct FileService {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    cipher: Arc<Cipher>,
    max_upload_size: u64,
}

impl FileService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        cipher: Cipher,
        max_upload_size: u64,
    ) -> Self {
        Self {
            blobs,
            metadata,
            cipher: Arc::new(cipher),
            max_upload_size,
        }
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Encrypt and store a payload, then record it under `principal`.
    #[instrument(skip_all, fields(owner = %principal, size = upload.data.len()))]
    pub async fn upload(&self, principal: Principal, upload: NewUpload) -> Result<FileView, FileError> {
        let size = upload.data.len() as u64;
        if size > self.max_upload_size {
            return Err(FileError::Validation(format!(
                "File exceeds maximum size of {} bytes",
                self.max_upload_size
            )));
        }

        let original_name = validate_display_name(&upload.original_name)
            .map_err(|e| FileError::Validation(e.message().into()))?
            .to_string();
        let mime_type = match upload.mime_type.trim() {
            "" => DEFAULT_MIME_TYPE.to_string(),
            declared => validate_mime_type(declared)?.to_string(),
        };

        let storage_key = new_storage_key();
        let blob_locator = BlobKey::scoped(&principal.to_string(), &storage_key)
            .map_err(|e| FileError::Internal(e.to_string()))?;

        let sealed = self
            .cipher
            .encrypt(&upload.data)
            .map_err(|e| FileError::Internal(e.to_string()))?;

        self.blobs.put(&blob_locator, &sealed.ciphertext).await?;

        let created = self
            .metadata
            .create(NewFileRecord {
                storage_key,
                original_name,
                mime_type,
                size,
                owner: principal,
                blob_locator: blob_locator.clone(),
                iv: sealed.iv.to_vec(),
                visibility: Visibility::Private,
            })
            .await;

        match created {
            Ok(record) => {
                info!(file_id = %record.id, "File uploaded");
                Ok(record.into())
            }
            Err(e) => {
                // No record references the blob, so it is safe to drop.
                if let Err(cleanup) = self.blobs.delete(&blob_locator).await {
                    warn!(
                        error = %FileError::from(cleanup),
                        "Failed to remove blob after record creation failed"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Records owned by `principal`, newest first.
    #[instrument(skip_all, fields(owner = %principal))]
    pub async fn list(&self, principal: Principal) -> Result<Vec<FileView>, FileError> {
        let records = self.metadata.list_by_owner(principal).await?;
        Ok(records.into_iter().map(FileView::from).collect())
    }

    #[instrument(skip_all, fields(principal = %principal, file_id = %id))]
    pub async fn download(&self, principal: Principal, id: Uuid) -> Result<DownloadedFile, FileError> {
        let record = self.metadata.get_by_id(id).await?;
        authorize(principal, &record, Action::Download)?;

        let ciphertext = match self.blobs.get(&record.blob_locator).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if matches!(e, StorageError::NotFound(_)) {
                    // Record outlived its blob, possibly through a racing delete.
                    warn!("Blob missing for existing record");
                }
                return Err(e.into());
            }
        };

        let data = self
            .cipher
            .decrypt(&ciphertext, &record.iv)
            .map_err(|e| decryption_failure(id, e))?;

        if data.len() as u64 != record.size {
            error!(
                expected = record.size,
                actual = data.len(),
                "Decrypted size does not match record"
            );
            return Err(FileError::Decryption("size mismatch".into()));
        }

        if let Err(e) = self.metadata.increment_download_count(id).await {
            warn!(error = %e, "Download count not incremented");
        }

        Ok(DownloadedFile {
            original_name: record.original_name,
            mime_type: record.mime_type,
            data,
        })
    }

    /// Remove the blob, then the record.
    ///
    /// A blob that is already gone counts as removed so that a retry can clear
    /// a record left behind by an earlier partial delete.
    #[instrument(skip_all, fields(principal = %principal, file_id = %id))]
    pub async fn delete(&self, principal: Principal, id: Uuid) -> Result<(), FileError> {
        let record = self.metadata.get_by_id(id).await?;
        authorize(principal, &record, Action::Delete)?;

        match self.blobs.delete(&record.blob_locator).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => warn!("Blob already removed"),
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.metadata.delete_by_id(id).await {
            error!(error = %e, "Blob deleted but record remains");
            return Err(FileError::Storage(format!(
                "record {id} could not be removed after its blob was deleted: {e}"
            )));
        }

        info!("File deleted");
        Ok(())
    }

    #[instrument(skip_all, fields(principal = %principal, file_id = %id))]
    pub async fn set_visibility(
        &self,
        principal: Principal,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<FileView, FileError> {
        let record = self.metadata.get_by_id(id).await?;
        authorize(principal, &record, Action::ChangeVisibility)?;

        if record.visibility == visibility {
            return Ok(record.into());
        }

        let updated = self.metadata.set_visibility(id, visibility).await?;
        info!(visibility = visibility.as_str(), "Visibility changed");
        Ok(updated.into())
    }
}

/// `<unix-millis>-<random token>`. Never derived from user input.
fn new_storage_key() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// The MIME type is replayed as the `Content-Type` of every download.
fn validate_mime_type(declared: &str) -> Result<&str, FileError> {
    let is_header_safe = HeaderValue::from_str(declared).is_ok();
    if !is_header_safe || declared.parse::<Mime>().is_err() {
        return Err(FileError::Validation("Invalid MIME type".into()));
    }
    Ok(declared)
}

fn decryption_failure(id: Uuid, err: CipherError) -> FileError {
    error!(file_id = %id, error = %err, "Stored ciphertext failed to decrypt");
    FileError::Decryption(err.to_string())
}
