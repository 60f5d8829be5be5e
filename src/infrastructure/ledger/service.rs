//! Usage ledger service

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::client::{
    redact_key, ClientAccount, ClientAccountRepository, ClientApiKey, ClientInfo,
    MAX_USAGE_LIMIT,
};
use crate::domain::ledger::{Authorization, EnforcementMode};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_ledger_decision, record_usage_recorded};

/// Ledger of per-key usage counters
#[async_trait]
pub trait UsageLedgerTrait: Send + Sync + Debug {
    /// Read-only decision for a key
    async fn check(&self, api_key: &str) -> Result<Authorization, DomainError>;

    /// True iff the key exists and has quota left. Never mutates.
    async fn authorize(&self, api_key: &str) -> Result<bool, DomainError> {
        Ok(self.check(api_key).await?.is_granted())
    }

    /// Add one unit to the key's counter without re-checking the limit.
    /// Unknown keys are ignored.
    async fn record_usage(&self, api_key: &str) -> Result<(), DomainError>;

    /// Check and increment in one atomic step; the counter never passes the limit
    async fn try_consume(&self, api_key: &str) -> Result<Authorization, DomainError>;

    async fn describe(&self, api_key: &str) -> Result<Option<ClientInfo>, DomainError>;

    async fn list_all(&self) -> Result<Vec<ClientInfo>, DomainError>;

    /// Number of provisioned keys, without loading them
    async fn count_clients(&self) -> Result<usize, DomainError>;

    /// Create an account under a freshly generated key
    async fn provision(
        &self,
        name: &str,
        usage_limit: Option<u64>,
    ) -> Result<ClientAccount, DomainError>;
}

#[derive(Debug)]
pub struct UsageLedger<R: ClientAccountRepository> {
    repository: Arc<R>,
    default_usage_limit: u64,
}

impl<R: ClientAccountRepository> UsageLedger<R> {
    pub fn new(repository: Arc<R>, default_usage_limit: u64) -> Self {
        Self {
            repository,
            default_usage_limit,
        }
    }
}

#[async_trait]
impl<R: ClientAccountRepository + 'static> UsageLedgerTrait for UsageLedger<R> {
    async fn check(&self, api_key: &str) -> Result<Authorization, DomainError> {
        let decision = match self.repository.find(api_key).await? {
            None => Authorization::UnknownKey,
            Some(account) if account.has_quota() => Authorization::Granted,
            Some(_) => Authorization::QuotaExceeded,
        };

        record_ledger_decision(EnforcementMode::Advisory, decision);
        debug!(key = %redact_key(api_key), %decision, "Ledger check");

        Ok(decision)
    }

    async fn record_usage(&self, api_key: &str) -> Result<(), DomainError> {
        let matched = self.repository.increment_usage(api_key).await?;
        record_usage_recorded(matched);

        if matched {
            debug!(key = %redact_key(api_key), "Usage recorded");
        } else {
            debug!(key = %redact_key(api_key), "Usage for unknown key ignored");
        }

        Ok(())
    }

    async fn try_consume(&self, api_key: &str) -> Result<Authorization, DomainError> {
        let decision = self.repository.try_increment_usage(api_key).await?;

        record_ledger_decision(EnforcementMode::Strict, decision);
        if decision.is_granted() {
            record_usage_recorded(true);
        }
        debug!(key = %redact_key(api_key), %decision, "Ledger consume");

        Ok(decision)
    }

    async fn describe(&self, api_key: &str) -> Result<Option<ClientInfo>, DomainError> {
        Ok(self
            .repository
            .find(api_key)
            .await?
            .map(|account| account.info()))
    }

    async fn list_all(&self) -> Result<Vec<ClientInfo>, DomainError> {
        let accounts = self.repository.list().await?;
        Ok(accounts.iter().map(ClientAccount::info).collect())
    }

    async fn count_clients(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    async fn provision(
        &self,
        name: &str,
        usage_limit: Option<u64>,
    ) -> Result<ClientAccount, DomainError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(DomainError::validation("Client name cannot be empty"));
        }

        let limit = usage_limit.unwrap_or(self.default_usage_limit);
        if limit > MAX_USAGE_LIMIT {
            return Err(DomainError::validation(format!(
                "Usage limit cannot exceed {}",
                MAX_USAGE_LIMIT
            )));
        }
        if limit == 0 {
            warn!(client = %name, "Provisioning client with a zero usage limit");
        }

        let account = ClientAccount::new(ClientApiKey::generate(), name, limit);
        let created = self.repository.create(account).await?;

        info!(
            client = %created.name(),
            key = %created.api_key().redacted(),
            usage_limit = created.usage_limit(),
            "Client provisioned"
        );

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::client::{MockClientAccountRepository, DEFAULT_USAGE_LIMIT};
    use crate::infrastructure::client::InMemoryClientAccountRepository;

    fn ledger_with(accounts: Vec<ClientAccount>) -> UsageLedger<InMemoryClientAccountRepository> {
        let repo = Arc::new(InMemoryClientAccountRepository::with_accounts(accounts));
        UsageLedger::new(repo, DEFAULT_USAGE_LIMIT)
    }

    fn account(key: &str, name: &str, count: u64, limit: u64) -> ClientAccount {
        ClientAccount::new(ClientApiKey::new(key), name, limit).with_usage_count(count)
    }

    #[tokio::test]
    async fn test_unknown_key_is_denied_and_absent() {
        let ledger = ledger_with(vec![account("abc", "Acme", 0, 10)]);

        assert!(!ledger.authorize("xyz").await.unwrap());
        assert_eq!(ledger.check("xyz").await.unwrap(), Authorization::UnknownKey);
        assert!(ledger.describe("xyz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_limit_allows_exactly_limit_cycles() {
        let limit = 5;
        let ledger = ledger_with(vec![account("abc", "Acme", 0, limit)]);

        for _ in 0..limit {
            assert!(ledger.authorize("abc").await.unwrap());
            ledger.record_usage("abc").await.unwrap();
        }

        assert!(!ledger.authorize("abc").await.unwrap());
        assert_eq!(
            ledger.check("abc").await.unwrap(),
            Authorization::QuotaExceeded
        );
    }

    #[tokio::test]
    async fn test_authorize_does_not_mutate() {
        let ledger = ledger_with(vec![account("abc", "Acme", 3, 10)]);

        for _ in 0..4 {
            ledger.authorize("abc").await.unwrap();
        }

        let info = ledger.describe("abc").await.unwrap().unwrap();
        assert_eq!(info.usage_count, 3);
    }

    #[tokio::test]
    async fn test_records_accumulate_and_remaining_tracks() {
        let ledger = ledger_with(vec![account("abc", "Acme", 2, 4)]);

        for n in 1..=4u64 {
            ledger.record_usage("abc").await.unwrap();

            let info = ledger.describe("abc").await.unwrap().unwrap();
            assert_eq!(info.usage_count, 2 + n);
            assert_eq!(info.remaining, info.usage_limit as i64 - info.usage_count as i64);
        }

        // Past the limit: record does not re-validate
        let info = ledger.describe("abc").await.unwrap().unwrap();
        assert_eq!(info.usage_count, 6);
        assert_eq!(info.remaining, -2);
    }

    #[tokio::test]
    async fn test_record_unknown_key_is_noop() {
        let ledger = ledger_with(vec![account("abc", "Acme", 1, 10)]);

        ledger.record_usage("ghost").await.unwrap();

        let all = ledger.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].usage_count, 1);
    }

    #[tokio::test]
    async fn test_last_unit_scenario() {
        let ledger = ledger_with(vec![account("abc", "Acme", 999, 1000)]);

        assert!(ledger.authorize("abc").await.unwrap());
        ledger.record_usage("abc").await.unwrap();

        let info = ledger.describe("abc").await.unwrap().unwrap();
        assert_eq!(
            info,
            ClientInfo {
                name: "Acme".to_string(),
                usage_count: 1000,
                usage_limit: 1000,
                remaining: 0,
            }
        );
        assert!(!ledger.authorize("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_all_returns_every_account() {
        let ledger = ledger_with(vec![
            account("k1", "Acme", 10, 100),
            account("k2", "Globex", 7, 5),
        ]);

        let all = ledger.list_all().await.unwrap();
        assert_eq!(all.len(), 2);

        for info in &all {
            assert_eq!(info.remaining, info.usage_limit as i64 - info.usage_count as i64);
        }

        let globex = all.iter().find(|i| i.name == "Globex").unwrap();
        assert_eq!(globex.remaining, -2);
    }

    #[tokio::test]
    async fn test_advisory_interleaving_overshoots_limit() {
        let ledger = ledger_with(vec![account("abc", "Acme", 9, 10)]);

        // Both requests pass the check before either records
        assert!(ledger.authorize("abc").await.unwrap());
        assert!(ledger.authorize("abc").await.unwrap());
        ledger.record_usage("abc").await.unwrap();
        ledger.record_usage("abc").await.unwrap();

        let info = ledger.describe("abc").await.unwrap().unwrap();
        assert_eq!(info.usage_count, 11);
        assert_eq!(info.remaining, -1);
    }

    #[tokio::test]
    async fn test_concurrent_try_consume_never_exceeds_limit() {
        let limit = 10;
        let ledger = Arc::new(ledger_with(vec![account("abc", "Acme", 0, limit)]));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.try_consume("abc").await.unwrap() })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap().is_granted() {
                granted += 1;
            }
        }

        assert_eq!(granted, limit);
        let info = ledger.describe("abc").await.unwrap().unwrap();
        assert_eq!(info.usage_count, limit);
        assert_eq!(info.remaining, 0);
    }

    #[tokio::test]
    async fn test_try_consume_unknown_key() {
        let ledger = ledger_with(vec![]);
        assert_eq!(
            ledger.try_consume("nope").await.unwrap(),
            Authorization::UnknownKey
        );
    }

    #[tokio::test]
    async fn test_provision_generates_key_and_defaults() {
        let ledger = ledger_with(vec![]);

        let created = ledger.provision("  Acme  ", None).await.unwrap();
        assert_eq!(created.name(), "Acme");
        assert_eq!(created.usage_count(), 0);
        assert_eq!(created.usage_limit(), DEFAULT_USAGE_LIMIT);
        assert_eq!(created.api_key().as_str().len(), 36);

        let other = ledger.provision("Globex", Some(50)).await.unwrap();
        assert_ne!(created.api_key(), other.api_key());
        assert_eq!(other.usage_limit(), 50);

        assert!(ledger.authorize(created.api_key().as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn test_provision_rejects_blank_name() {
        let ledger = ledger_with(vec![]);
        let result = ledger.provision("   ", Some(10)).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_provision_rejects_limit_beyond_storage_range() {
        let ledger = ledger_with(vec![]);

        let result = ledger.provision("Acme", Some(MAX_USAGE_LIMIT + 1)).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(ledger.count_clients().await.unwrap(), 0);

        let created = ledger.provision("Acme", Some(MAX_USAGE_LIMIT)).await.unwrap();
        assert_eq!(created.remaining(), i64::MAX);
    }

    #[tokio::test]
    async fn test_oversized_default_limit_is_rejected() {
        let repo = Arc::new(InMemoryClientAccountRepository::new());
        let ledger = UsageLedger::new(repo, u64::MAX);

        assert!(ledger.provision("Acme", None).await.is_err());
        assert!(ledger.provision("Acme", Some(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_count_clients_uses_repository_count() {
        let mut repo = MockClientAccountRepository::new();
        repo.expect_count().times(1).returning(|| Ok(3));
        repo.expect_list().never();

        let ledger = UsageLedger::new(Arc::new(repo), DEFAULT_USAGE_LIMIT);
        assert_eq!(ledger.count_clients().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut repo = MockClientAccountRepository::new();
        repo.expect_find()
            .returning(|_| Err(DomainError::storage("connection refused")));
        repo.expect_increment_usage()
            .returning(|_| Err(DomainError::storage("connection refused")));

        let ledger = UsageLedger::new(Arc::new(repo), DEFAULT_USAGE_LIMIT);

        assert!(ledger.authorize("abc").await.unwrap_err().is_storage());
        assert!(ledger.describe("abc").await.unwrap_err().is_storage());
        assert!(ledger.record_usage("abc").await.unwrap_err().is_storage());
    }

    #[tokio::test]
    async fn test_record_usage_hits_storage_once() {
        let mut repo = MockClientAccountRepository::new();
        repo.expect_increment_usage()
            .withf(|key| key == "abc")
            .times(1)
            .returning(|_| Ok(true));

        let ledger = UsageLedger::new(Arc::new(repo), DEFAULT_USAGE_LIMIT);
        ledger.record_usage("abc").await.unwrap();
    }
}
