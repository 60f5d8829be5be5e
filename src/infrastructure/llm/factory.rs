use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::http_client::HttpClient;
use super::OpenAiProvider;
use crate::config::CategorizationConfig;
use crate::domain::llm::{ChatRequest, Completion, LlmProvider};
use crate::domain::DomainError;

/// Builds the categorization model client from configuration
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Without an API key the server still starts; categorize calls then
    /// fail with a provider error.
    pub fn create(config: &CategorizationConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            warn!("No model API key configured; categorization requests will fail");
            return Ok(Arc::new(UnconfiguredProvider));
        };

        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
        Ok(Arc::new(OpenAiProvider::with_base_url(
            client,
            api_key,
            &config.base_url,
        )))
    }
}

/// Placeholder used when no model credentials are available
#[derive(Debug)]
pub struct UnconfiguredProvider;

#[async_trait]
impl LlmProvider for UnconfiguredProvider {
    async fn complete(
        &self,
        _model: &str,
        _request: ChatRequest,
    ) -> Result<Completion, DomainError> {
        Err(DomainError::provider(
            self.provider_name(),
            "Model API key is not configured",
        ))
    }

    fn provider_name(&self) -> &'static str {
        "unconfigured"
    }
}
