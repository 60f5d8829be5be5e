//! OpenAI-compatible `/v1/chat/completions` client

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use crate::domain::llm::{ChatRequest, Completion, LlmProvider, TokenUsage};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_llm_request;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

const PROVIDER: &str = "openai";

#[derive(Debug)]
pub struct OpenAiProvider<C: HttpClientTrait> {
    client: C,
    bearer: String,
    endpoint: String,
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    /// `base_url` is the host root; the completions path is appended
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            bearer: format!("Bearer {}", api_key.into()),
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
        }
    }

    async fn send(&self, model: &str, request: &ChatRequest) -> Result<Completion, DomainError> {
        let body = serde_json::to_value(CompletionBody::new(model, request))
            .map_err(|e| DomainError::provider(PROVIDER, format!("Failed to encode request: {}", e)))?;

        let headers = vec![
            ("Authorization", self.bearer.as_str()),
            ("Content-Type", "application/json"),
        ];
        let raw = self.client.post_json(&self.endpoint, headers, &body).await?;

        let reply: CompletionReply = serde_json::from_value(raw)
            .map_err(|e| DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;
        reply.into_completion()
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenAiProvider<C> {
    async fn complete(&self, model: &str, request: ChatRequest) -> Result<Completion, DomainError> {
        let started = Instant::now();
        let result = self.send(model, &request).await;

        record_llm_request(PROVIDER, model, result.is_ok(), started.elapsed());
        result
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> CompletionBody<'a> {
    fn new(model: &'a str, request: &'a ChatRequest) -> Self {
        Self {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionReply {
    id: String,
    model: String,
    choices: Vec<ReplyChoice>,
    usage: Option<ReplyUsage>,
}

impl CompletionReply {
    fn into_completion(self) -> Result<Completion, DomainError> {
        let Some(choice) = self.choices.into_iter().next() else {
            return Err(DomainError::provider(PROVIDER, "No choices in response"));
        };

        Ok(Completion {
            id: self.id,
            model: self.model,
            text: choice.message.content.unwrap_or_default(),
            usage: self.usage.map(|u| TokenUsage {
                prompt: u.prompt_tokens,
                completion: u.completion_tokens,
            }),
        })
    }
}

#[derive(Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ReplyUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

    #[tokio::test]
    async fn test_complete_sends_prompt_and_reads_reply() {
        let reply = serde_json::json!({
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {"role": "assistant", "content": "Transporte"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 40, "completion_tokens": 2, "total_tokens": 42}
        });

        let client = MockHttpClient::new().with_response(COMPLETIONS_URL, reply);
        let provider = OpenAiProvider::new(client, "sk-test");

        let request = ChatRequest::new()
            .system("Classify the expense")
            .user("Uber to the client")
            .temperature(0.0)
            .max_tokens(20);
        let completion = provider.complete("gpt-4o-mini", request).await.unwrap();

        assert_eq!(completion.id, "chatcmpl-123");
        assert_eq!(completion.text, "Transporte");
        assert_eq!(completion.usage.map(|u| u.total()), Some(42));

        let sent = &provider.client.requests()[0];
        assert_eq!(sent["model"], "gpt-4o-mini");
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][1]["content"], "Uber to the client");
        assert_eq!(sent["max_tokens"], 20);
    }

    #[tokio::test]
    async fn test_unset_knobs_are_omitted() {
        let reply = serde_json::json!({
            "id": "x",
            "model": "m",
            "choices": [{"message": {"content": null}}]
        });
        let client = MockHttpClient::new().with_response(COMPLETIONS_URL, reply);
        let provider = OpenAiProvider::new(client, "sk-test");

        let completion = provider
            .complete("m", ChatRequest::new().user("hi"))
            .await
            .unwrap();
        assert_eq!(completion.text, "");
        assert!(completion.usage.is_none());

        let sent = &provider.client.requests()[0];
        assert!(sent.get("temperature").is_none());
        assert!(sent.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn test_empty_choices_is_provider_error() {
        let client = MockHttpClient::new().with_response(
            COMPLETIONS_URL,
            serde_json::json!({"id": "x", "model": "m", "choices": []}),
        );
        let provider = OpenAiProvider::new(client, "sk-test");

        let err = provider
            .complete("m", ChatRequest::new().user("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = MockHttpClient::new().with_error(COMPLETIONS_URL, "connection reset");
        let provider = OpenAiProvider::new(client, "sk-test");

        let result = provider.complete("m", ChatRequest::new().user("hi")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let provider =
            OpenAiProvider::with_base_url(MockHttpClient::new(), "k", "http://localhost:8000/");
        assert_eq!(provider.endpoint, "http://localhost:8000/v1/chat/completions");
    }
}
