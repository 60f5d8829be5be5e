//! Expense categorization domain
//!
//! The billed unit of work: one free-text expense description in, one
//! accounting category label out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DomainError;
use crate::domain::ledger::Authorization;

/// Longest description accepted, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Longest label accepted back from the model, in characters
const MAX_LABEL_CHARS: usize = 80;

/// A validated categorization request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizationRequest {
    description: String,
}

impl CategorizationRequest {
    /// Validate and normalize a raw description
    pub fn new(description: impl Into<String>) -> Result<Self, CategorizationError> {
        let description = description.into();
        let trimmed = description.trim();

        if trimmed.is_empty() {
            return Err(CategorizationError::Validation(
                "Description cannot be empty".to_string(),
            ));
        }

        if trimmed.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(CategorizationError::Validation(format!(
                "Description cannot exceed {} characters",
                MAX_DESCRIPTION_CHARS
            )));
        }

        Ok(Self {
            description: trimmed.to_string(),
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Category label returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    #[serde(rename = "categoria")]
    label: String,
}

impl ExpenseCategory {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Extract a label from raw model output.
    ///
    /// Models tend to wrap the answer in quotes or end it with a period;
    /// only the first line is kept.
    pub fn from_completion(text: &str) -> Option<Self> {
        let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
        let label = line
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
            .trim_end_matches('.')
            .trim();

        if label.is_empty() || label.chars().count() > MAX_LABEL_CHARS {
            return None;
        }

        Some(Self::new(label))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Failure of a metered categorization call
#[derive(Debug, Error)]
pub enum CategorizationError {
    /// Ledger refused the key; nothing was charged
    #[error("Access denied: {0}")]
    Denied(Authorization),

    #[error("Invalid request: {0}")]
    Validation(String),

    /// The model call failed or returned nothing usable
    #[error("Categorization failed: {0}")]
    Provider(String),

    #[error(transparent)]
    Ledger(#[from] DomainError),
}

impl CategorizationError {
    /// Stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Denied(_) => "denied",
            Self::Validation(_) => "validation",
            Self::Provider(_) => "provider",
            Self::Ledger(_) => "ledger",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_trims_description() {
        let request = CategorizationRequest::new("  Uber para o cliente  ").unwrap();
        assert_eq!(request.description(), "Uber para o cliente");
    }

    #[test]
    fn test_request_rejects_blank() {
        let err = CategorizationRequest::new("   \n").unwrap_err();
        assert!(matches!(err, CategorizationError::Validation(_)));
    }

    #[test]
    fn test_request_rejects_oversized() {
        let long = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(CategorizationRequest::new(long).is_err());

        let exact = "a".repeat(MAX_DESCRIPTION_CHARS);
        assert!(CategorizationRequest::new(exact).is_ok());
    }

    #[test]
    fn test_from_completion_cleans_label() {
        let category = ExpenseCategory::from_completion("\"Transporte.\"\n").unwrap();
        assert_eq!(category.label(), "Transporte");

        let category = ExpenseCategory::from_completion("\n  Alimentação\nextra").unwrap();
        assert_eq!(category.label(), "Alimentação");
    }

    #[test]
    fn test_from_completion_rejects_empty() {
        assert!(ExpenseCategory::from_completion("").is_none());
        assert!(ExpenseCategory::from_completion("\"\"").is_none());
        assert!(ExpenseCategory::from_completion(&"x".repeat(200)).is_none());
    }

    #[test]
    fn test_category_wire_name() {
        let json = serde_json::to_value(ExpenseCategory::new("Impostos")).unwrap();
        assert_eq!(json, serde_json::json!({"categoria": "Impostos"}));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            CategorizationError::Denied(Authorization::QuotaExceeded).kind(),
            "denied"
        );
        assert_eq!(
            CategorizationError::from(DomainError::storage("down")).kind(),
            "ledger"
        );
    }
}
