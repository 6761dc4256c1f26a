use serde::Deserialize;

/// Which blob backend to use.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

/// App-level blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    /// Blob backend. Default: filesystem.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Upload ceiling in plaintext bytes. Default: 10 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    /// Required when `backend = "s3"`.
    pub s3: Option<S3Config>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemConfig {
    /// Root directory for blobs. Default: "./data/blobs".
    #[serde(default = "default_filesystem_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Region name. Default: "us-east-1".
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, COS).
    pub endpoint: Option<String>,
    /// Falls back to the AWS environment/profile chain when unset.
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Use path-style addressing. Default: false.
    #[serde(default)]
    pub path_style: bool,
    /// Per-request timeout in seconds. Default: 30.
    #[serde(default = "default_s3_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Encryption key configuration.
#[derive(Deserialize, Clone)]
pub struct EncryptionConfig {
    /// 32-byte AES-256 key as 64 hex characters.
    pub key: String,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("key", &"<redacted>")
            .finish()
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Filesystem
}
fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}
fn default_filesystem_path() -> String {
    "./data/blobs".into()
}
fn default_s3_region() -> String {
    "us-east-1".into()
}
fn default_s3_request_timeout() -> u64 {
    30
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            path: default_filesystem_path(),
        }
    }
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            max_upload_size: default_max_upload_size(),
            filesystem: FilesystemConfig::default(),
            s3: None,
        }
    }
}
