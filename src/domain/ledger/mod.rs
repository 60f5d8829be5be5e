//! Usage ledger domain
//!
//! Decision types shared by the ledger service and its storage backends.
//! `authorize` collapses every non-granted decision to `false`; the richer
//! variants only feed logs and metrics.

use serde::{Deserialize, Serialize};

/// Outcome of an authorization check against one API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authorization {
    /// Account exists and `usage_count < usage_limit`
    Granted,
    /// No account matches the key
    UnknownKey,
    /// Account exists but the counter reached its limit
    QuotaExceeded,
}

impl Authorization {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Stable label for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::UnknownKey => "unknown_key",
            Self::QuotaExceeded => "quota_exceeded",
        }
    }
}

impl std::fmt::Display for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a metered call reserves its unit of usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    /// Read-only check before the work, unconditional increment after it.
    /// Concurrent requests may overshoot the limit.
    #[default]
    Advisory,
    /// Atomic check-and-increment before the work. The limit is a hard cap.
    Strict,
}

impl EnforcementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advisory => "advisory",
            Self::Strict => "strict",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_granted_is_granted() {
        assert!(Authorization::Granted.is_granted());
        assert!(!Authorization::UnknownKey.is_granted());
        assert!(!Authorization::QuotaExceeded.is_granted());
    }

    #[test]
    fn test_enforcement_mode_default_is_advisory() {
        assert_eq!(EnforcementMode::default(), EnforcementMode::Advisory);
    }

    #[test]
    fn test_enforcement_mode_deserialization() {
        let mode: EnforcementMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(mode, EnforcementMode::Strict);

        let mode: EnforcementMode = serde_json::from_str("\"advisory\"").unwrap();
        assert_eq!(mode, EnforcementMode::Advisory);
    }
}
