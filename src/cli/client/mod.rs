//! Client command - provisions and lists client accounts

use clap::Subcommand;
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::domain::client::ClientInfo;
use crate::infrastructure::logging::{init_logging, LoggingConfig};

#[derive(Subcommand)]
pub enum ClientCommand {
    /// Create a client and print its new API key
    Add {
        /// Company name shown in usage reports
        #[arg(long)]
        name: String,

        /// Usage limit; defaults to ledger.default_usage_limit
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Print every client with its usage
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: ClientCommand) -> anyhow::Result<()> {
    let config = super::load_config()?;
    require_persistent_storage(&config)?;
    init_logging(&LoggingConfig::from(&config));

    let ledger = crate::create_ledger(&config).await?;

    match command {
        ClientCommand::Add { name, limit } => {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("client name must not be empty");
            }

            let account = ledger.provision(name, limit).await?;
            info!(
                client = account.name(),
                key = %account.api_key().redacted(),
                limit = account.usage_limit(),
                "Client provisioned"
            );

            // The full key is shown once, on stdout
            println!("{}", account.api_key().as_str());
        }
        ClientCommand::List { json } => {
            let clients = ledger.list_all().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&clients)?);
            } else {
                print!("{}", render_table(&clients));
            }
        }
    }

    Ok(())
}

/// Accounts made here must outlive the command, which a memory store does not
fn require_persistent_storage(config: &AppConfig) -> anyhow::Result<()> {
    if config.storage.backend == StorageBackend::Memory {
        anyhow::bail!(
            "client commands need the postgres backend; \
             declare in-memory accounts under [[storage.seed_clients]] instead"
        );
    }
    Ok(())
}

fn render_table(clients: &[ClientInfo]) -> String {
    let width = clients
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("CLIENT".len());

    let mut out = format!(
        "{:<width$}  {:>10}  {:>10}  {:>10}\n",
        "CLIENT", "USED", "LIMIT", "REMAINING"
    );
    for client in clients {
        out.push_str(&format!(
            "{:<width$}  {:>10}  {:>10}  {:>10}\n",
            client.name, client.usage_count, client.usage_limit, client.remaining
        ));
    }
    out
}
