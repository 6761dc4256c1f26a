use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vaultbox_common::Cipher;
use vaultbox_common::config::{StorageAppConfig, StorageBackend};
use vaultbox_common::storage::BlobStore;
use vaultbox_common::storage::filesystem::FilesystemBlobStore;
use vaultbox_common::storage::s3::S3BlobStore;
use vaultbox_server::config::AppConfig;
use vaultbox_server::database::init_db;
use vaultbox_server::files::{DbMetadataStore, FileService};
use vaultbox_server::state::AppState;

async fn init_blob_store(config: &StorageAppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemBlobStore::new(PathBuf::from(&config.filesystem.path))
                .await
                .context("failed to initialise filesystem blob store")?;
            info!("Using filesystem blob store at {}", config.filesystem.path);
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let Some(s3) = &config.s3 else {
                bail!("storage.backend = \"s3\" requires a [storage.s3] section");
            };
            let store = S3BlobStore::new(s3).context("failed to initialise S3 blob store")?;
            info!("Using S3 blob store, bucket {}", s3.bucket);
            Ok(Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    // Refuse to start without a usable key rather than fail every request later.
    let cipher = Cipher::from_hex(&config.encryption.key).context("invalid encryption key")?;

    let blobs = init_blob_store(&config.storage).await?;
    let db = init_db(&config.database.url)
        .await
        .context("failed to connect to database")?;
    let metadata = Arc::new(DbMetadataStore::new(db));

    let files = FileService::new(blobs, metadata, cipher, config.storage.max_upload_size);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = AppState {
        config: Arc::new(config),
        files,
    };
    let app = vaultbox_server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
