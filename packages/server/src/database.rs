use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::file_record;

/// Connect and bring the `file_record` table up to date.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(32)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("vaultbox_server::entity::*")
        .sync(&db)
        .await?;

    ensure_indexes(&db).await;

    Ok(db)
}

/// Index backing the per-owner listing, newest first.
pub async fn ensure_indexes(db: &DatabaseConnection) {
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_file_record_owner_created")
        .table(file_record::Entity)
        .col(file_record::Column::OwnerId)
        .col(file_record::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_file_record_owner_created exists"),
        Err(e) => warn!("Failed to create index idx_file_record_owner_created: {}", e),
    }
}
