use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vaultbox_common::storage::BlobKey;

use crate::entity::file_record;

use super::error::MetadataError;

/// Authenticated identity making a request. Owners are compared by identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal(i32);

impl Principal {
    pub const fn new(user_id: i32) -> Self {
        Self(user_id)
    }

    pub const fn id(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.0)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            other => Err(format!("unknown visibility '{other}'")),
        }
    }
}

/// Full metadata record. Internal to the service layer.
#[derive(Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: Uuid,
    pub storage_key: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub owner: Principal,
    pub blob_locator: BlobKey,
    pub iv: Vec<u8>,
    pub visibility: Visibility,
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Keeps the locator and IV out of logs.
impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("id", &self.id)
            .field("original_name", &self.original_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .field("owner", &self.owner)
            .field("visibility", &self.visibility)
            .field("download_count", &self.download_count)
            .finish_non_exhaustive()
    }
}

/// Values for a record about to be created; the store assigns the id and
/// timestamps.
#[derive(Clone)]
pub struct NewFileRecord {
    pub storage_key: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub owner: Principal,
    pub blob_locator: BlobKey,
    pub iv: Vec<u8>,
    pub visibility: Visibility,
}

/// Caller-facing view of a record, without storage internals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileView {
    pub id: Uuid,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub visibility: Visibility,
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileRecord> for FileView {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            original_name: record.original_name,
            mime_type: record.mime_type,
            size: record.size,
            visibility: record.visibility,
            download_count: record.download_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// An upload request as seen by the service.
pub struct NewUpload {
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Decrypted download with the fields needed for the response envelope.
pub struct DownloadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl TryFrom<file_record::Model> for FileRecord {
    type Error = MetadataError;

    fn try_from(model: file_record::Model) -> Result<Self, Self::Error> {
        let invalid = |msg: String| MetadataError::InvalidRow {
            id: model.id,
            reason: msg,
        };

        let blob_locator =
            BlobKey::parse(&model.blob_locator).map_err(|e| invalid(e.to_string()))?;
        let visibility = model.visibility.parse().map_err(invalid)?;
        let size = u64::try_from(model.size).map_err(|_| invalid("negative size".into()))?;
        let download_count = u64::try_from(model.download_count)
            .map_err(|_| invalid("negative download count".into()))?;

        Ok(Self {
            id: model.id,
            storage_key: model.storage_key,
            original_name: model.original_name,
            mime_type: model.mime_type,
            size,
            owner: Principal::new(model.owner_id),
            blob_locator,
            iv: model.iv,
            visibility,
            download_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
