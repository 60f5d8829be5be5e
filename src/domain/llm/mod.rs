//! Chat-completion model types and the provider seam

mod chat;
mod provider;

pub use chat::{ChatMessage, ChatRequest, ChatRole, Completion, TokenUsage};
pub use provider::LlmProvider;

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
