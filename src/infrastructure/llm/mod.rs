//! LLM provider implementations

mod factory;
mod http_client;
mod openai;

pub use factory::{LlmProviderFactory, UnconfiguredProvider};
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL};
