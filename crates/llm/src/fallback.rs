use relay_common::{Message, MessageRole, RelayError};
use serde::{Deserialize, Serialize};

use crate::registry::{Capability, ProviderEntry};

/// Substrings of an upstream error body that mean the account is out of
/// credit, checked in order.
pub const QUOTA_MARKERS: &[&str] = &["quota", "insufficient"];

/// Returns the first quota marker found in `body`, ignoring case.
pub fn quota_marker(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();
    QUOTA_MARKERS
        .iter()
        .copied()
        .find(|marker| lower.contains(marker))
}

/// Whether a dispatch error qualifies for the one fallback retry.
///
/// Only upstream responses qualify; transport failures never do.
pub fn is_quota_error(error: &RelayError) -> bool {
    match error {
        RelayError::Upstream { body, .. } => quota_marker(body).is_some(),
        _ => false,
    }
}

/// Sampling parameters for the primary completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
}

fn default_max_tokens() -> u32 {
    10_000
}

fn default_temperature() -> Option<f32> {
    Some(0.7)
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// How the quota fallback retry differs from the primary call.
///
/// The retry runs with a terser system prompt and a lower output cap than
/// the primary call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackProfile {
    /// Replaces the composed system message; `None` keeps it.
    #[serde(default = "default_fallback_prompt")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_fallback_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_fallback_prompt() -> Option<String> {
    Some("You are Relay.".into())
}

fn default_fallback_max_tokens() -> u32 {
    8_000
}

impl Default for FallbackProfile {
    fn default() -> Self {
        Self {
            system_prompt: default_fallback_prompt(),
            max_tokens: default_fallback_max_tokens(),
            temperature: None,
        }
    }
}

impl FallbackProfile {
    pub fn options(&self) -> CompletionOptions {
        CompletionOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Rewrite the primary message set for the fallback target.
    ///
    /// Swaps in the profile's system prompt and strips image parts when the
    /// target cannot see them.
    pub fn rewrite(&self, messages: &[Message], target: &ProviderEntry) -> Vec<Message> {
        let keep_images = target.has_capability(Capability::Vision);
        messages
            .iter()
            .map(|msg| match (msg.role, &self.system_prompt) {
                (MessageRole::System, Some(prompt)) => Message::system(prompt.clone()),
                _ if !keep_images && msg.content.has_images() => msg.without_images(),
                _ => msg.clone(),
            })
            .collect()
    }
}
