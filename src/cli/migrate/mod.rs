//! Migrate command - applies pending storage migrations

use tracing::info;

use crate::config::StorageBackend;
use crate::infrastructure::logging::{init_logging, LoggingConfig};
use crate::infrastructure::storage::{storage_migrations, PostgresConfig, PostgresMigrator};

pub async fn run() -> anyhow::Result<()> {
    let config = super::load_config()?;
    init_logging(&LoggingConfig::from(&config));

    if config.storage.backend == StorageBackend::Memory {
        info!("In-memory storage has no schema, nothing to migrate");
        return Ok(());
    }

    let pool = PostgresConfig::from_storage_config(&config.storage)?
        .connect()
        .await?;
    let migrator = PostgresMigrator::new(pool);
    let applied = migrator.run(&storage_migrations()).await?;
    let version = migrator.current_version().await?;

    info!(applied, version = ?version, "Migrations complete");
    Ok(())
}
