use async_trait::async_trait;
use relay_common::{RelayError, Result};
use serde::Deserialize;
use tracing::debug;

use crate::client::{ChatTransport, Completion, CompletionRequest};
use crate::registry::ProviderEntry;

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

/// HTTP transport for OpenAI-compatible chat completion endpoints.
///
/// Every backend in the registry speaks this wire format; they differ only in
/// endpoint, credential and a few backend-specific headers.
#[derive(Clone, Default)]
pub struct OpenAiCompatClient {
    http_client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn build_request(
        &self,
        provider: &ProviderEntry,
        api_key: &str,
        request: &CompletionRequest,
    ) -> reqwest::RequestBuilder {
        let mut http_req = self
            .http_client
            .post(&provider.url)
            .bearer_auth(api_key)
            .json(request);
        for (name, value) in provider.backend.extra_headers() {
            http_req = http_req.header(*name, *value);
        }
        http_req
    }

    fn parse_completion(body: &str) -> Result<Completion> {
        let response: OpenAiResponse = serde_json::from_str(body).map_err(|e| {
            RelayError::Transport(format!("Failed to parse completion response: {e}"))
        })?;

        // An empty choice list is reported as an empty answer, not an error.
        let message = response.choices.into_iter().next().map(|c| c.message);
        Ok(Completion {
            content: message
                .as_ref()
                .and_then(|m| m.content.clone())
                .unwrap_or_default(),
            reasoning: message
                .and_then(|m| m.reasoning_content)
                .filter(|r| !r.is_empty()),
        })
    }
}

#[async_trait]
impl ChatTransport for OpenAiCompatClient {
    async fn send(
        &self,
        provider: &ProviderEntry,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<Completion> {
        debug!(
            provider = %provider.id,
            backend = %provider.backend,
            model = %request.model,
            max_tokens = request.max_tokens,
            "Sending completion request"
        );

        let response = self
            .build_request(provider, api_key, request)
            .send()
            .await
            .map_err(|e| {
                RelayError::Transport(format!("{} request failed: {e}", provider.backend))
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            RelayError::Transport(format!("Failed to read {} response: {e}", provider.backend))
        })?;

        if !status.is_success() {
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Self::parse_completion(&body_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BackendKind, ProviderRegistry};
    use relay_common::Message;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "moonshotai/kimi-k2-instruct".into(),
            messages: vec![Message::user("Hello")],
            max_tokens: 10_000,
            temperature: Some(0.7),
            stream: false,
        }
    }

    #[test]
    fn nvidia_request_carries_backend_header() {
        let registry = ProviderRegistry::builtin();
        let provider = registry.lookup("tier1").unwrap();
        assert_eq!(provider.backend, BackendKind::Nvidia);

        let built = OpenAiCompatClient::new()
            .build_request(provider, "nv-key", &request())
            .build()
            .unwrap();

        assert_eq!(built.url().as_str(), provider.url);
        assert_eq!(built.headers()["authorization"], "Bearer nv-key");
        assert_eq!(built.headers()["ngrok-skip-browser-warning"], "true");
        assert_eq!(built.headers()["content-type"], "application/json");
    }

    #[test]
    fn openrouter_request_has_only_bearer_auth() {
        let registry = ProviderRegistry::builtin();
        let provider = registry.fallback_target();

        let built = OpenAiCompatClient::new()
            .build_request(provider, "or-key", &request())
            .build()
            .unwrap();

        assert_eq!(built.headers()["authorization"], "Bearer or-key");
        assert!(built.headers().get("ngrok-skip-browser-warning").is_none());
    }

    #[test]
    fn parse_content_and_reasoning() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"42","reasoning_content":"6 x 7"}}]}"#;
        let completion = OpenAiCompatClient::parse_completion(body).unwrap();
        assert_eq!(completion.content, "42");
        assert_eq!(completion.reasoning.as_deref(), Some("6 x 7"));
    }

    #[test]
    fn parse_missing_choices_is_empty_answer() {
        let completion = OpenAiCompatClient::parse_completion(r#"{"id":"x"}"#).unwrap();
        assert_eq!(completion.content, "");
        assert!(completion.reasoning.is_none());
    }

    #[test]
    fn parse_null_content_is_empty_answer() {
        let body = r#"{"choices":[{"message":{"content":null,"reasoning_content":""}}]}"#;
        let completion = OpenAiCompatClient::parse_completion(body).unwrap();
        assert_eq!(completion.content, "");
        assert!(completion.reasoning.is_none());
    }

    #[test]
    fn parse_garbage_is_transport_error() {
        let err = OpenAiCompatClient::parse_completion("<html>").unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
    }
}
