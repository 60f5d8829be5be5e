//! In-memory client account repository

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::client::{ClientAccount, ClientAccountRepository};
use crate::domain::ledger::Authorization;
use crate::domain::DomainError;

/// In-memory implementation of ClientAccountRepository
///
/// Accounts are kept in insertion order so `list` mirrors a table scan.
#[derive(Debug)]
pub struct InMemoryClientAccountRepository {
    accounts: Arc<RwLock<Vec<ClientAccount>>>,
}

impl InMemoryClientAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a repository pre-populated with accounts
    pub fn with_accounts(accounts: Vec<ClientAccount>) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(accounts)),
        }
    }
}

impl Default for InMemoryClientAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientAccountRepository for InMemoryClientAccountRepository {
    async fn find(&self, api_key: &str) -> Result<Option<ClientAccount>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|a| a.api_key().as_str() == api_key)
            .cloned())
    }

    async fn increment_usage(&self, api_key: &str) -> Result<bool, DomainError> {
        let mut accounts = self.accounts.write().await;

        match accounts.iter_mut().find(|a| a.api_key().as_str() == api_key) {
            Some(account) => {
                account.record_usage();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn try_increment_usage(&self, api_key: &str) -> Result<Authorization, DomainError> {
        let mut accounts = self.accounts.write().await;

        let Some(account) = accounts.iter_mut().find(|a| a.api_key().as_str() == api_key) else {
            return Ok(Authorization::UnknownKey);
        };

        if !account.has_quota() {
            return Ok(Authorization::QuotaExceeded);
        }

        account.record_usage();
        Ok(Authorization::Granted)
    }

    async fn list(&self) -> Result<Vec<ClientAccount>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.clone())
    }

    async fn create(&self, account: ClientAccount) -> Result<ClientAccount, DomainError> {
        let mut accounts = self.accounts.write().await;

        if accounts.iter().any(|a| a.api_key() == account.api_key()) {
            return Err(DomainError::conflict(format!(
                "Client with key '{}' already exists",
                account.api_key().redacted()
            )));
        }

        accounts.push(account.clone());
        Ok(account)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.len())
    }
}
