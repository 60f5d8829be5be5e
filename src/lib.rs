//! Contabil API
//!
//! Accounting assistant backend for several client companies. Every AI
//! request is metered against the caller's API key in a usage ledger and
//! refused once the key's quota is spent.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::collections::HashSet;
use std::sync::Arc;

use api::state::AppState;
use crate::config::{SeedClient, StorageBackend};
use domain::client::{redact_key, ClientAccount, ClientApiKey, MAX_USAGE_LIMIT};
use infrastructure::{
    categorization::CategorizationService,
    client::{InMemoryClientAccountRepository, PostgresClientAccountRepository},
    ledger::{UsageLedger, UsageLedgerTrait},
    llm::LlmProviderFactory,
    storage::{run_storage_migrations, PostgresConfig},
};
use tracing::{info, warn};

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let ledger = create_ledger(config).await?;

    let provider = LlmProviderFactory::create(&config.categorization)?;
    let provider_name = provider.provider_name();

    let categorizer = Arc::new(CategorizationService::new(
        ledger.clone(),
        provider,
        config.categorization.clone(),
        config.ledger.enforcement,
    ));
    info!(
        provider = provider_name,
        model = %config.categorization.model,
        enforcement = categorizer.enforcement().as_str(),
        "Categorization service configured"
    );

    if config.admin.token.is_none() {
        warn!("No admin token configured, admin API is disabled");
    }

    Ok(AppState::new(ledger, categorizer).with_admin_token(config.admin.token.clone()))
}

/// Open the configured store and wrap it in a ledger
pub async fn create_ledger(config: &AppConfig) -> anyhow::Result<Arc<dyn UsageLedgerTrait>> {
    let default_limit = config.ledger.default_usage_limit;

    match config.storage.backend {
        StorageBackend::Memory => {
            let accounts = seed_accounts(&config.storage.seed_clients, default_limit)?;
            info!(
                seeded = accounts.len(),
                "Using in-memory ledger storage; usage is lost on restart"
            );
            let repository = Arc::new(InMemoryClientAccountRepository::with_accounts(accounts));
            Ok(Arc::new(UsageLedger::new(repository, default_limit)))
        }
        StorageBackend::Postgres => {
            let pool = PostgresConfig::from_storage_config(&config.storage)?
                .connect()
                .await?;
            info!("PostgreSQL connection established");

            if !config.storage.seed_clients.is_empty() {
                warn!("storage.seed_clients only applies to the memory backend; ignoring");
            }

            if config.storage.run_migrations {
                let applied = run_storage_migrations(&pool).await?;
                info!(applied, "Storage migrations complete");
            }

            let repository = Arc::new(PostgresClientAccountRepository::new(pool));
            Ok(Arc::new(UsageLedger::new(repository, default_limit)))
        }
    }
}

/// Accounts declared under `[[storage.seed_clients]]`
fn seed_accounts(seeds: &[SeedClient], default_limit: u64) -> anyhow::Result<Vec<ClientAccount>> {
    let mut seen = HashSet::new();

    seeds
        .iter()
        .map(|seed| {
            let name = seed.name.trim();
            if seed.api_key.trim().is_empty() || name.is_empty() {
                anyhow::bail!("seed client entries need a non-empty api_key and name");
            }
            if !seen.insert(seed.api_key.as_str()) {
                anyhow::bail!("duplicate seed client key {}", redact_key(&seed.api_key));
            }

            let limit = seed.usage_limit.unwrap_or(default_limit);
            if limit > MAX_USAGE_LIMIT {
                anyhow::bail!("seed client {} has usage_limit above {}", name, MAX_USAGE_LIMIT);
            }

            Ok(ClientAccount::new(ClientApiKey::new(seed.api_key.as_str()), name, limit))
        })
        .collect()
}
