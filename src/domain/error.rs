use thiserror::Error;

/// Failures shared by the ledger, its stores and the model client
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("Already exists: {message}")]
    Conflict { message: String },

    #[error("Misconfigured: {message}")]
    Configuration { message: String },

    #[error("Model provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// The ledger store could not be read or written
    #[error("Ledger storage failure: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}
