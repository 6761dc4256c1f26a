use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "file_record")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Generated object name within the owner's namespace.
    pub storage_key: String,

    /// Display name supplied by the uploader.
    pub original_name: String,

    /// MIME type as declared by the uploader.
    pub mime_type: String,

    /// Plaintext size in bytes.
    pub size: i64,

    pub owner_id: i32,

    /// Full blob key of the ciphertext.
    #[sea_orm(unique)]
    pub blob_locator: String,

    /// AES-GCM nonce the blob was sealed under.
    pub iv: Vec<u8>,

    /// One of: private, public
    pub visibility: String,

    pub download_count: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
