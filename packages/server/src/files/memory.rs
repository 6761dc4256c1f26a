use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::MetadataError;
use super::metadata::MetadataStore;
use super::record::{FileRecord, NewFileRecord, Principal, Visibility};

/// In-process [`MetadataStore`]. Records are lost on restart.
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: Mutex<HashMap<Uuid, FileRecord>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord, MetadataError> {
        let now = Utc::now();
        let stored = FileRecord {
            id: Uuid::now_v7(),
            storage_key: record.storage_key,
            original_name: record.original_name,
            mime_type: record.mime_type,
            size: record.size,
            owner: record.owner,
            blob_locator: record.blob_locator,
            iv: record.iv,
            visibility: record.visibility,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.records.lock().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<FileRecord, MetadataError> {
        self.records
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(MetadataError::NotFound(id))
    }

    async fn list_by_owner(&self, owner: Principal) -> Result<Vec<FileRecord>, MetadataError> {
        let mut records: Vec<FileRecord> = self
            .records
            .lock()
            .await
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<(), MetadataError> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(&id).ok_or(MetadataError::NotFound(id))?;
        record.download_count += 1;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn set_visibility(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<FileRecord, MetadataError> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(&id).ok_or(MetadataError::NotFound(id))?;
        record.visibility = visibility;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), MetadataError> {
        self.records
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(MetadataError::NotFound(id))
    }
}
