//! Embedded, versioned schema migrations

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// One schema change
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
}

impl Migration {
    pub const fn new(version: i64, description: &'static str, up: &'static str) -> Self {
        Self {
            version,
            description,
            up,
        }
    }
}

/// Migrations in apply order
pub fn storage_migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "Create clients table",
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            api_key     TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            usage_count BIGINT NOT NULL DEFAULT 0 CHECK (usage_count >= 0),
            usage_limit BIGINT NOT NULL DEFAULT 1000 CHECK (usage_limit >= 0),
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        CREATE INDEX IF NOT EXISTS idx_clients_created_at ON clients (created_at);
        "#,
    )]
}

/// Applies pending migrations and tracks them in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Apply one migration inside a transaction. Returns false if it was
    /// already recorded.
    pub async fn apply(&self, migration: &Migration) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to check migration status: {}", e))
                })?;

        if applied {
            return Ok(false);
        }

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        Ok(true)
    }

    /// Apply every pending migration, returning how many ran
    pub async fn run(&self, migrations: &[Migration]) -> Result<usize, DomainError> {
        self.ensure_migrations_table().await?;

        let mut ran = 0;
        for migration in migrations {
            if self.apply(migration).await? {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "Applied migration"
                );
                ran += 1;
            }
        }

        Ok(ran)
    }

    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// Bring the schema up to date
pub async fn run_storage_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    PostgresMigrator::new(pool.clone())
        .run(&storage_migrations())
        .await
}
