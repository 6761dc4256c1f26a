use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::BlobStore;
use crate::config::S3Config;

/// Blob store backed by an S3-compatible object service (AWS S3, MinIO, COS).
///
/// Every request is bounded by the configured request timeout; an expired
/// deadline surfaces as [`StorageError::Backend`].
pub struct S3BlobStore {
    bucket: Box<Bucket>,
}

impl S3BlobStore {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid S3 region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid S3 credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials).map_err(backend)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }
        bucket.set_request_timeout(Some(Duration::from_secs(config.request_timeout_secs)));

        debug!(
            bucket = %config.bucket,
            region = %config.region,
            path_style = config.path_style,
            "S3 blob store configured"
        );
        Ok(Self { bucket })
    }
}

fn backend(err: S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// Map a response status to a storage outcome.
fn check_status(status: u16, key: &BlobKey) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        other => Err(StorageError::Backend(format!("unexpected status {other}"))),
    }
}

/// Normalise request errors; a 404 may arrive as an error body depending on
/// how the client is built.
fn classify(err: S3Error, key: &BlobKey) -> StorageError {
    match err {
        S3Error::HttpFailWithBody(status, _) => match check_status(status, key) {
            Err(e) => e,
            Ok(()) => StorageError::Backend(format!("request failed with status {status}")),
        },
        other => backend(other),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &BlobKey, data: &[u8]) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key.as_str(), data, "application/octet-stream")
            .await
            .map_err(|e| classify(e, key))?;
        check_status(response.status_code(), key)
    }

    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(key.as_str())
            .await
            .map_err(|e| classify(e, key))?;
        check_status(response.status_code(), key)?;
        Ok(response.bytes().to_vec())
    }

    async fn delete(&self, key: &BlobKey) -> Result<(), StorageError> {
        // S3 DELETE succeeds for missing keys, so probe first to report NotFound.
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let response = self
            .bucket
            .delete_object(key.as_str())
            .await
            .map_err(|e| classify(e, key))?;
        check_status(response.status_code(), key)
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        match self.bucket.head_object(key.as_str()).await {
            Ok((_, status)) => match check_status(status, key) {
                Ok(()) => Ok(true),
                Err(StorageError::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            },
            Err(e) => match classify(e, key) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }
}
