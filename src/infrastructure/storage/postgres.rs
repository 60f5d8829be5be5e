//! PostgreSQL connection pooling

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::StorageConfig;
use crate::domain::DomainError;

/// Pool settings for the ledger database
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 600,
        }
    }

    /// Build from the `[storage]` section; the URL must be set
    pub fn from_storage_config(config: &StorageConfig) -> Result<Self, DomainError> {
        let url = config.database_url.as_deref().ok_or_else(|| {
            DomainError::configuration(
                "storage.database_url (or DATABASE_URL) is required for the postgres backend",
            )
        })?;

        Ok(Self::new(url)
            .with_max_connections(config.max_connections)
            .with_connect_timeout(config.connect_timeout_secs))
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self.min_connections = self.min_connections.min(max);
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Open the pool and verify one connection
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        info!(max_connections = self.max_connections, "PostgreSQL pool ready");
        Ok(pool)
    }
}
