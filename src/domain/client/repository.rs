//! Client account repository trait

use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::entity::ClientAccount;
use crate::domain::ledger::Authorization;
use crate::domain::DomainError;

/// Repository for the `clients` table
///
/// Every method is a single storage round trip. Nothing here spans more
/// than one statement, so callers composing a read with a later write get
/// no isolation between them.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClientAccountRepository: Send + Sync + Debug {
    /// Look up an account by exact key match
    async fn find(&self, api_key: &str) -> Result<Option<ClientAccount>, DomainError>;

    /// Add one to `usage_count`. Returns false when no account matched.
    async fn increment_usage(&self, api_key: &str) -> Result<bool, DomainError>;

    /// Atomically add one to `usage_count` only if it is below `usage_limit`
    async fn try_increment_usage(&self, api_key: &str) -> Result<Authorization, DomainError>;

    /// All accounts in storage order
    async fn list(&self) -> Result<Vec<ClientAccount>, DomainError>;

    /// Insert a new account; fails with a conflict if the key exists
    async fn create(&self, account: ClientAccount) -> Result<ClientAccount, DomainError>;

    /// Number of provisioned accounts
    async fn count(&self) -> Result<usize, DomainError>;
}
