//! PostgreSQL client account repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::client::{ClientAccount, ClientAccountRepository, ClientApiKey};
use crate::domain::ledger::Authorization;
use crate::domain::DomainError;

/// PostgreSQL implementation of ClientAccountRepository
#[derive(Debug, Clone)]
pub struct PostgresClientAccountRepository {
    pool: PgPool,
}

impl PostgresClientAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, api_key: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clients WHERE api_key = $1)")
            .bind(api_key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up client: {}", e)))
    }
}

#[async_trait]
impl ClientAccountRepository for PostgresClientAccountRepository {
    async fn find(&self, api_key: &str) -> Result<Option<ClientAccount>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT api_key, name, usage_count, usage_limit, created_at
            FROM clients
            WHERE api_key = $1
            "#,
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get client: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn increment_usage(&self, api_key: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE clients SET usage_count = usage_count + 1 WHERE api_key = $1")
            .bind(api_key)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record usage: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_increment_usage(&self, api_key: &str) -> Result<Authorization, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET usage_count = usage_count + 1
            WHERE api_key = $1 AND usage_count < usage_limit
            "#,
        )
        .bind(api_key)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to consume usage: {}", e)))?;

        if result.rows_affected() > 0 {
            return Ok(Authorization::Granted);
        }

        // Nothing changed: either no such key or the counter is at its limit
        if self.exists(api_key).await? {
            Ok(Authorization::QuotaExceeded)
        } else {
            Ok(Authorization::UnknownKey)
        }
    }

    async fn list(&self) -> Result<Vec<ClientAccount>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT api_key, name, usage_count, usage_limit, created_at
            FROM clients
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list clients: {}", e)))?;

        let mut accounts = Vec::with_capacity(rows.len());

        for row in rows {
            accounts.push(row_to_account(&row)?);
        }

        Ok(accounts)
    }

    async fn create(&self, account: ClientAccount) -> Result<ClientAccount, DomainError> {
        let usage_count = to_db_count(account.usage_count(), "usage_count")?;
        let usage_limit = to_db_count(account.usage_limit(), "usage_limit")?;

        sqlx::query(
            r#"
            INSERT INTO clients (api_key, name, usage_count, usage_limit, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.api_key().as_str())
        .bind(account.name())
        .bind(usage_count)
        .bind(usage_limit)
        .bind(account.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict(format!(
                    "Client with key '{}' already exists",
                    account.api_key().redacted()
                ))
            } else {
                DomainError::storage(format!("Failed to create client: {}", e))
            }
        })?;

        Ok(account)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count clients: {}", e)))?;

        Ok(count as usize)
    }
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<ClientAccount, DomainError> {
    let api_key: String = row.get("api_key");
    let name: String = row.get("name");
    let usage_count: i64 = row.get("usage_count");
    let usage_limit: i64 = row.get("usage_limit");
    let created_at: DateTime<Utc> = row.get("created_at");

    let account = ClientAccount::new(
        ClientApiKey::new(api_key),
        name,
        from_db_count(usage_limit, "usage_limit")?,
    )
    .with_usage_count(from_db_count(usage_count, "usage_count")?)
    .with_created_at(created_at);

    Ok(account)
}

fn from_db_count(value: i64, column: &str) -> Result<u64, DomainError> {
    u64::try_from(value)
        .map_err(|_| DomainError::storage(format!("Negative {} in database: {}", column, value)))
}

fn to_db_count(value: u64, column: &str) -> Result<i64, DomainError> {
    i64::try_from(value)
        .map_err(|_| DomainError::validation(format!("{} out of range: {}", column, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_conversion() {
        assert_eq!(from_db_count(0, "usage_count").unwrap(), 0);
        assert_eq!(from_db_count(1000, "usage_limit").unwrap(), 1000);
        assert!(from_db_count(-1, "usage_count").unwrap_err().is_storage());

        assert_eq!(to_db_count(42, "usage_limit").unwrap(), 42);
        assert!(matches!(
            to_db_count(u64::MAX, "usage_limit"),
            Err(DomainError::Validation { .. })
        ));
    }
}
