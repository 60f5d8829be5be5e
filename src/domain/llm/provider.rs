use async_trait::async_trait;
use std::fmt::Debug;

use super::{ChatRequest, Completion};
use crate::domain::DomainError;

/// Chat-completion backend used by categorization
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    async fn complete(&self, model: &str, request: ChatRequest) -> Result<Completion, DomainError>;

    /// Short label used in logs and metrics
    fn provider_name(&self) -> &'static str;
}
