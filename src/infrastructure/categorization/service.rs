//! Metered expense categorization

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::CategorizationConfig;
use crate::domain::categorization::{CategorizationError, CategorizationRequest, ExpenseCategory};
use crate::domain::client::redact_key;
use crate::domain::ledger::EnforcementMode;
use crate::domain::llm::{ChatRequest, LlmProvider};
use crate::infrastructure::ledger::UsageLedgerTrait;
use crate::infrastructure::observability::record_categorization;

#[async_trait]
pub trait CategorizationServiceTrait: Send + Sync + Debug {
    /// Categorize one description on behalf of `api_key`, charging one unit
    async fn categorize(
        &self,
        api_key: &str,
        description: &str,
    ) -> Result<ExpenseCategory, CategorizationError>;
}

/// Wraps one model call in the ledger's authorize/record protocol
#[derive(Debug)]
pub struct CategorizationService {
    ledger: Arc<dyn UsageLedgerTrait>,
    provider: Arc<dyn LlmProvider>,
    config: CategorizationConfig,
    enforcement: EnforcementMode,
}

impl CategorizationService {
    pub fn new(
        ledger: Arc<dyn UsageLedgerTrait>,
        provider: Arc<dyn LlmProvider>,
        config: CategorizationConfig,
        enforcement: EnforcementMode,
    ) -> Self {
        Self {
            ledger,
            provider,
            config,
            enforcement,
        }
    }

    pub fn enforcement(&self) -> EnforcementMode {
        self.enforcement
    }

    async fn metered(
        &self,
        api_key: &str,
        request: &CategorizationRequest,
    ) -> Result<ExpenseCategory, CategorizationError> {
        match self.enforcement {
            EnforcementMode::Advisory => {
                let decision = self.ledger.check(api_key).await?;
                if !decision.is_granted() {
                    return Err(CategorizationError::Denied(decision));
                }

                let outcome = self.invoke(request).await;

                // Charged whether or not the model call succeeded
                self.ledger.record_usage(api_key).await?;
                outcome
            }
            EnforcementMode::Strict => {
                let decision = self.ledger.try_consume(api_key).await?;
                if !decision.is_granted() {
                    return Err(CategorizationError::Denied(decision));
                }

                self.invoke(request).await
            }
        }
    }

    async fn invoke(
        &self,
        request: &CategorizationRequest,
    ) -> Result<ExpenseCategory, CategorizationError> {
        let chat = ChatRequest::new()
            .system(self.config.system_prompt.as_str())
            .user(request.description())
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens);

        let completion = self
            .provider
            .complete(&self.config.model, chat)
            .await
            .map_err(|e| CategorizationError::Provider(e.to_string()))?;

        ExpenseCategory::from_completion(&completion.text).ok_or_else(|| {
            CategorizationError::Provider("Model returned no usable category".to_string())
        })
    }
}

#[async_trait]
impl CategorizationServiceTrait for CategorizationService {
    async fn categorize(
        &self,
        api_key: &str,
        description: &str,
    ) -> Result<ExpenseCategory, CategorizationError> {
        let started = Instant::now();

        // Malformed requests are rejected before the ledger sees them
        let result = match CategorizationRequest::new(description) {
            Ok(request) => self.metered(api_key, &request).await,
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        record_categorization(outcome, started.elapsed());

        match &result {
            Ok(category) => debug!(
                key = %redact_key(api_key),
                category = %category.label(),
                "Expense categorized"
            ),
            Err(CategorizationError::Provider(message)) => warn!(
                key = %redact_key(api_key),
                error = %message,
                "Categorization failed after charging"
            ),
            Err(e) => debug!(key = %redact_key(api_key), error = %e, "Categorization rejected"),
        }

        result
    }
}
