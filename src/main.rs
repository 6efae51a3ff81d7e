//! estate-server: the estate REST backend
//!
//! Configuration comes from the YAML file named by `ESTATE_CONFIG` (if set),
//! then environment overrides.

use anyhow::Result;
use estate::config::{AppConfig, StorageBackend};
use estate::server::ServerBuilder;
use estate::storage::{EntityStores, LocalFileStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("estate=info,tower_http=info")),
        )
        .init();

    let config_path = std::env::var("ESTATE_CONFIG").ok();
    let config = AppConfig::load(config_path.as_deref())?;

    let files = LocalFileStore::new(config.files.root.clone());
    files.initialize(&["documents", "uploads"]).await?;

    let stores = open_stores(&config).await?;
    let addr = config.bind_address();

    tracing::info!(
        storage = ?config.storage.backend,
        files = %config.files.root.display(),
        "starting estate-server"
    );

    ServerBuilder::new()
        .with_config(config)
        .with_stores(stores)
        .with_file_store(Arc::new(files))
        .serve(&addr)
        .await
}

async fn open_stores(config: &AppConfig) -> Result<EntityStores> {
    match config.storage.backend {
        StorageBackend::InMemory => Ok(EntityStores::in_memory()),
        #[cfg(feature = "mongodb_backend")]
        StorageBackend::Mongodb => {
            let client = mongodb::Client::with_uri_str(&config.storage.uri).await?;
            let database = client.database(&config.storage.database);
            tracing::info!(database = %config.storage.database, "connected to MongoDB");
            Ok(EntityStores::mongodb(database).await?)
        }
        #[cfg(not(feature = "mongodb_backend"))]
        StorageBackend::Mongodb => Err(anyhow::anyhow!(
            "storage backend 'mongodb' requires the mongodb_backend feature"
        )),
    }
}
