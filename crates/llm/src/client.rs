use async_trait::async_trait;
use relay_common::{Message, Result};
use serde::{Deserialize, Serialize};

use crate::registry::ProviderEntry;

/// Body of an OpenAI-compatible chat completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub stream: bool,
}

/// What came back from a successful completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    /// Chain-of-thought text, for backends that return `reasoning_content`
    pub reasoning: Option<String>,
}

/// One HTTP exchange with a completion backend.
///
/// Implementations map a non-2xx response to `RelayError::Upstream` with the
/// status and raw body, and connection or decoding failures to
/// `RelayError::Transport`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        provider: &ProviderEntry,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<Completion>;
}
