use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::file_record;

use super::error::MetadataError;
use super::record::{FileRecord, NewFileRecord, Principal, Visibility};

/// Persistence for file records.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a record, assigning its id and timestamps.
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord, MetadataError>;

    async fn get_by_id(&self, id: Uuid) -> Result<FileRecord, MetadataError>;

    /// All records owned by `owner`, newest first.
    async fn list_by_owner(&self, owner: Principal) -> Result<Vec<FileRecord>, MetadataError>;

    /// Atomically add one to the download counter.
    async fn increment_download_count(&self, id: Uuid) -> Result<(), MetadataError>;

    async fn set_visibility(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<FileRecord, MetadataError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), MetadataError>;
}

/// [`MetadataStore`] backed by the `file_record` table.
pub struct DbMetadataStore {
    conn: DatabaseConnection,
}

impl DbMetadataStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

fn to_i64(value: u64, what: &str) -> Result<i64, MetadataError> {
    i64::try_from(value)
        .map_err(|_| MetadataError::Database(sea_orm::DbErr::Custom(format!("{what} overflows"))))
}

#[async_trait]
impl MetadataStore for DbMetadataStore {
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord, MetadataError> {
        let now = Utc::now();
        let model = file_record::ActiveModel {
            id: Set(Uuid::now_v7()),
            storage_key: Set(record.storage_key),
            original_name: Set(record.original_name),
            mime_type: Set(record.mime_type),
            size: Set(to_i64(record.size, "size")?),
            owner_id: Set(record.owner.id()),
            blob_locator: Set(record.blob_locator.to_string()),
            iv: Set(record.iv),
            visibility: Set(record.visibility.as_str().to_string()),
            download_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.conn).await?;
        FileRecord::try_from(inserted)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<FileRecord, MetadataError> {
        let model = file_record::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or(MetadataError::NotFound(id))?;
        FileRecord::try_from(model)
    }

    async fn list_by_owner(&self, owner: Principal) -> Result<Vec<FileRecord>, MetadataError> {
        file_record::Entity::find()
            .filter(file_record::Column::OwnerId.eq(owner.id()))
            .order_by_desc(file_record::Column::CreatedAt)
            .order_by_desc(file_record::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(FileRecord::try_from)
            .collect()
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<(), MetadataError> {
        // Single UPDATE so concurrent downloads cannot lose increments.
        let result = file_record::Entity::update_many()
            .col_expr(
                file_record::Column::DownloadCount,
                Expr::col(file_record::Column::DownloadCount).add(1),
            )
            .col_expr(file_record::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(file_record::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(MetadataError::NotFound(id));
        }
        Ok(())
    }

    async fn set_visibility(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<FileRecord, MetadataError> {
        let result = file_record::Entity::update_many()
            .col_expr(
                file_record::Column::Visibility,
                Expr::value(visibility.as_str()),
            )
            .col_expr(file_record::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(file_record::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(MetadataError::NotFound(id));
        }
        self.get_by_id(id).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), MetadataError> {
        let result = file_record::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(MetadataError::NotFound(id));
        }
        Ok(())
    }
}
