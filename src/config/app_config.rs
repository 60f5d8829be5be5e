use serde::Deserialize;

use crate::domain::client::DEFAULT_USAGE_LIMIT;
use crate::domain::ledger::EnforcementMode;
use crate::infrastructure::llm::DEFAULT_OPENAI_BASE_URL;
use crate::infrastructure::observability::ObservabilityConfig;

const DEFAULT_SYSTEM_PROMPT: &str = "Você é um assistente contábil. Classifique a despesa descrita \
pelo usuário em uma única categoria contábil (por exemplo: Alimentação, Transporte, Hospedagem, \
Material de Escritório, Serviços de Terceiros, Impostos e Taxas, Aluguel, Outros). Responda \
apenas com o nome da categoria.";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub categorization: CategorizationConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local accounts, lost on restart
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    /// Apply pending migrations when the server starts
    pub run_migrations: bool,
    /// Accounts loaded into the memory backend at startup
    pub seed_clients: Vec<SeedClient>,
}

/// One `[[storage.seed_clients]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct SeedClient {
    pub api_key: String,
    pub name: String,
    /// Falls back to `ledger.default_usage_limit`
    #[serde(default)]
    pub usage_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub enforcement: EnforcementMode,
    /// Limit given to `client add` when no `--limit` is passed
    pub default_usage_limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CategorizationConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared secret for `/admin`; the admin API is closed when unset
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
            max_connections: 10,
            connect_timeout_secs: 5,
            run_migrations: true,
            seed_clients: Vec::new(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enforcement: EnforcementMode::default(),
            default_usage_limit: DEFAULT_USAGE_LIMIT,
        }
    }
}

impl Default for CategorizationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_secs: 30,
            temperature: 0.0,
            max_tokens: 20,
        }
    }
}

impl AppConfig {
    /// Layer `config/default`, `config/local` and `APP__*` variables, then
    /// fill unset secrets from their conventional variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(
            &["config/default", "config/local"],
            app_environment(),
            |name| std::env::var(name).ok(),
        )
    }

    fn load_from(
        files: &[&str],
        environment: config::Environment,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        for file in files {
            builder = builder.add_source(config::File::with_name(file).required(false));
        }

        let mut app_config: Self = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        app_config.apply_env_fallbacks(lookup);

        Ok(app_config)
    }

    fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.storage.database_url.is_none() {
            self.storage.database_url = lookup("DATABASE_URL");
        }

        if self.categorization.api_key.is_none() {
            self.categorization.api_key = lookup("OPENAI_API_KEY");
        }
    }
}

fn app_environment() -> config::Environment {
    config::Environment::with_prefix("APP")
        .separator("__")
        .try_parsing(true)
}
