//! Client account entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default ceiling for newly provisioned accounts
pub const DEFAULT_USAGE_LIMIT: u64 = 1000;

/// Largest limit that storage (BIGINT) and `remaining` can represent
pub const MAX_USAGE_LIMIT: u64 = i64::MAX as u64;

/// Opaque API key identifying a billed client
///
/// No format is enforced: lookups are exact string matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientApiKey(String);

impl ClientApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a fresh random key (UUIDv4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs
    pub fn redacted(&self) -> String {
        redact_key(&self.0)
    }
}

impl From<String> for ClientApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ClientApiKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ClientApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Log-safe form of a raw key string
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{}...", prefix)
}

/// One provisioned API key with its usage counter and ceiling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAccount {
    api_key: ClientApiKey,
    name: String,
    usage_count: u64,
    usage_limit: u64,
    created_at: DateTime<Utc>,
}

impl ClientAccount {
    /// Create a fresh account with no recorded usage
    pub fn new(api_key: ClientApiKey, name: impl Into<String>, usage_limit: u64) -> Self {
        Self {
            api_key,
            name: name.into(),
            usage_count: 0,
            usage_limit,
            created_at: Utc::now(),
        }
    }

    /// Set the usage counter (used when restoring from storage)
    pub fn with_usage_count(mut self, usage_count: u64) -> Self {
        self.usage_count = usage_count;
        self
    }

    /// Set the creation timestamp (used when restoring from storage)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn api_key(&self) -> &ClientApiKey {
        &self.api_key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    pub fn usage_limit(&self) -> u64 {
        self.usage_limit
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True while at least one more unit may be consumed
    pub fn has_quota(&self) -> bool {
        self.usage_count < self.usage_limit
    }

    /// Units left before the limit; negative once the counter overshoots.
    /// Saturates at the bounds of `i64`.
    pub fn remaining(&self) -> i64 {
        let remaining = i128::from(self.usage_limit) - i128::from(self.usage_count);
        remaining.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Add one unit of consumption. Does not look at the limit.
    pub fn record_usage(&mut self) {
        self.usage_count += 1;
    }

    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            name: self.name.clone(),
            usage_count: self.usage_count,
            usage_limit: self.usage_limit,
            remaining: self.remaining(),
        }
    }
}

/// Public view of an account, as returned by `describe` and `list_all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(rename = "cliente")]
    pub name: String,
    #[serde(rename = "usos_realizados")]
    pub usage_count: u64,
    #[serde(rename = "limite")]
    pub usage_limit: u64,
    #[serde(rename = "restante")]
    pub remaining: i64,
}
