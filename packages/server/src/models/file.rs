use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::files::{FileView, Visibility};

/// Public view of a stored file. Storage keys, locators and IVs never appear here.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    /// File ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: Uuid,
    /// Display name supplied at upload.
    #[schema(example = "report.pdf")]
    pub original_name: String,
    /// MIME type declared at upload.
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    /// Plaintext size in bytes.
    #[schema(example = 1024)]
    pub size: u64,
    pub visibility: Visibility,
    #[schema(example = 0)]
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response DTO for listing files.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: u64,
}

/// Request body for changing a file's visibility.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateVisibilityRequest {
    #[schema(example = "public")]
    pub visibility: Visibility,
}

impl From<FileView> for FileResponse {
    fn from(view: FileView) -> Self {
        Self {
            id: view.id,
            original_name: view.original_name,
            mime_type: view.mime_type,
            size: view.size,
            visibility: view.visibility,
            download_count: view.download_count,
            created_at: view.created_at,
            updated_at: view.updated_at,
        }
    }
}

impl From<Vec<FileView>> for FileListResponse {
    fn from(views: Vec<FileView>) -> Self {
        let total = views.len() as u64;
        let files = views.into_iter().map(FileResponse::from).collect();
        Self { files, total }
    }
}
