//! Generation request and result types.

use crate::routing::RouteDecision;
use relay_common::RelayError;
use relay_llm::ProviderEntry;
use relay_memory::{ANONYMOUS_USER, MemoryRecord};
use serde::{Deserialize, Deserializer, Serialize};

/// Provider label reported when the quota fallback answered.
pub const FALLBACK_PROVIDER_LABEL: &str = "fallback (quota switched)";

/// Name shown for uploaded files that arrive without one.
pub const UNTITLED_FILE: &str = "untitled";

/// One inbound generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt: String,

    #[serde(default = "default_user", deserialize_with = "null_as_user")]
    pub user_id: String,

    /// Explicit provider id; ignored when the registry does not know it
    #[serde(default, rename = "model")]
    pub provider_override: Option<String>,

    /// Data URIs or URLs
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,

    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub enable_memory: bool,

    #[serde(default)]
    pub file_content: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,
}

fn default_user() -> String {
    ANONYMOUS_USER.into()
}

fn default_true() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_true))
}

fn null_as_user<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(default_user))
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            user_id: default_user(),
            provider_override: None,
            images: Vec::new(),
            enable_memory: true,
            file_content: None,
            file_name: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_override(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_override = Some(provider_id.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.enable_memory = enabled;
        self
    }

    pub fn with_file(mut self, name: Option<String>, content: impl Into<String>) -> Self {
        self.file_name = name;
        self.file_content = Some(content.into());
        self
    }

    pub fn has_image(&self) -> bool {
        !self.images.is_empty()
    }

    /// Uploaded file text, when there is any.
    pub fn file(&self) -> Option<(&str, &str)> {
        let content = self.file_content.as_deref().filter(|c| !c.is_empty())?;
        let name = self
            .file_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNTITLED_FILE);
        Some((name, content))
    }

    pub fn has_file(&self) -> bool {
        self.file().is_some()
    }
}

/// What the memory lookup produced for one generation.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryRecall {
    /// The request turned memory off; the store was not consulted
    Disabled,
    Retrieved(Vec<MemoryRecord>),
    /// The store failed; generation continues without memories
    Degraded(String),
}

impl MemoryRecall {
    pub fn memories(&self) -> &[MemoryRecord] {
        match self {
            Self::Retrieved(records) => records,
            Self::Disabled | Self::Degraded(_) => &[],
        }
    }

    pub fn count(&self) -> usize {
        self.memories().len()
    }
}

/// What happened to a fact extracted from the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryWrite {
    /// No trigger phrase, or memory disabled
    Skipped,
    Saved(MemoryRecord),
    /// The store rejected the write; not a generation failure
    Failed(String),
}

impl MemoryWrite {
    pub fn saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// A successful generation.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub response: String,
    pub reasoning: Option<String>,
    /// Classifier's pick
    pub route: RouteDecision,
    /// Entry that actually answered; differs from the route after a fallback
    pub served_by: ProviderEntry,
    pub fallback_used: bool,
    pub recall: MemoryRecall,
    pub memory_write: MemoryWrite,
    pub has_image: bool,
    pub has_file: bool,
}

impl GenerationOutput {
    pub fn provider_label(&self) -> String {
        if self.fallback_used {
            FALLBACK_PROVIDER_LABEL.to_string()
        } else {
            self.served_by.backend.as_str().to_string()
        }
    }
}

/// Failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Upstream,
    Transport,
    InvalidRequest,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Configuration => "API key not configured",
            Self::Upstream => "API Error",
            Self::Transport => "Generation failed",
            Self::InvalidRequest => "Invalid request",
        }
    }
}

/// A generation that produced no output.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationFailure {
    pub kind: FailureKind,
    /// HTTP status to report
    pub status: u16,
    pub details: Option<String>,
    /// Operator hint, e.g. "Add NVIDIA_API_KEY"
    pub setup: Option<String>,
}

impl From<RelayError> for GenerationFailure {
    fn from(error: RelayError) -> Self {
        let status = error.status();
        match error {
            RelayError::MissingCredential { env_var, .. } => Self {
                kind: FailureKind::Configuration,
                status,
                details: None,
                setup: Some(format!("Add {env_var}")),
            },
            RelayError::Config(msg) => Self {
                kind: FailureKind::Configuration,
                status,
                details: Some(msg),
                setup: None,
            },
            RelayError::Upstream { body, .. } => Self {
                kind: FailureKind::Upstream,
                status,
                details: Some(body),
                setup: None,
            },
            RelayError::InvalidRequest(msg) => Self {
                kind: FailureKind::InvalidRequest,
                status,
                details: Some(msg),
                setup: None,
            },
            other => Self {
                kind: FailureKind::Transport,
                status,
                details: Some(other.to_string()),
                setup: None,
            },
        }
    }
}

pub type GenerationResult = std::result::Result<GenerationOutput, GenerationFailure>;

/// Wire form of a generation result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Display name of the serving provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_saved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memories_used: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_image: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_file: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
}

impl From<&GenerationOutput> for GenerationResponse {
    fn from(output: &GenerationOutput) -> Self {
        Self {
            success: true,
            response: Some(output.response.clone()),
            reasoning: output.reasoning.clone(),
            model: Some(output.served_by.name.clone()),
            provider: Some(output.provider_label()),
            provider_id: Some(output.served_by.id.clone()),
            rank: Some(output.served_by.rank_label()),
            fallback_used: Some(output.fallback_used),
            memory_saved: Some(output.memory_write.saved()),
            memories_used: Some(output.recall.count()),
            has_image: Some(output.has_image),
            has_file: Some(output.has_file),
            ..Default::default()
        }
    }
}

impl From<&GenerationFailure> for GenerationResponse {
    fn from(failure: &GenerationFailure) -> Self {
        Self {
            success: false,
            error: Some(failure.kind.label().to_string()),
            details: failure.details.clone(),
            setup: failure.setup.clone(),
            ..Default::default()
        }
    }
}

impl From<&GenerationResult> for GenerationResponse {
    fn from(result: &GenerationResult) -> Self {
        match result {
            Ok(output) => output.into(),
            Err(failure) => failure.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_llm::BackendKind;

    #[test]
    fn request_defaults() {
        let req: GenerationRequest = serde_json::from_str(r#"{"prompt":"hi"}"#).unwrap();
        assert_eq!(req.user_id, "anonymous");
        assert!(req.enable_memory);
        assert!(req.images.is_empty());
        assert!(req.provider_override.is_none());
        assert!(!req.has_file());
    }

    #[test]
    fn request_accepts_nulls_and_camel_case() {
        let req: GenerationRequest = serde_json::from_str(
            r##"{
                "prompt": "look",
                "userId": null,
                "model": "tier2",
                "images": null,
                "enableMemory": false,
                "fileContent": "# Notes",
                "fileName": null
            }"##,
        )
        .unwrap();
        assert_eq!(req.user_id, "anonymous");
        assert_eq!(req.provider_override.as_deref(), Some("tier2"));
        assert!(!req.enable_memory);
        assert_eq!(req.file(), Some(("untitled", "# Notes")));
    }

    #[test]
    fn null_enable_memory_keeps_memory_on() {
        let req: GenerationRequest =
            serde_json::from_str(r#"{"prompt":"hi","enableMemory":null}"#).unwrap();
        assert!(req.enable_memory);
    }

    #[test]
    fn empty_file_content_is_no_file() {
        let req = GenerationRequest::new("x").with_file(Some("a.md".into()), "");
        assert!(!req.has_file());
    }

    #[test]
    fn missing_credential_maps_to_configuration() {
        let failure = GenerationFailure::from(RelayError::MissingCredential {
            backend: "nvidia".into(),
            env_var: BackendKind::Nvidia.env_var(),
        });
        assert_eq!(failure.kind, FailureKind::Configuration);
        assert_eq!(failure.status, 500);
        assert_eq!(failure.setup.as_deref(), Some("Add NVIDIA_API_KEY"));

        let wire = GenerationResponse::from(&failure);
        assert!(!wire.success);
        assert_eq!(wire.error.as_deref(), Some("API key not configured"));
    }

    #[test]
    fn upstream_failure_keeps_status_and_body() {
        let failure = GenerationFailure::from(RelayError::Upstream {
            status: 503,
            body: "overloaded".into(),
        });
        assert_eq!(failure.kind, FailureKind::Upstream);
        assert_eq!(failure.status, 503);

        let json = serde_json::to_value(GenerationResponse::from(&failure)).unwrap();
        assert_eq!(json["error"], "API Error");
        assert_eq!(json["details"], "overloaded");
        assert!(json.get("response").is_none());
    }

    #[test]
    fn transport_failure_is_generation_failed() {
        let failure = GenerationFailure::from(RelayError::Transport("connection reset".into()));
        assert_eq!(failure.kind.label(), "Generation failed");
        assert_eq!(failure.status, 500);
    }

    #[test]
    fn recall_counts() {
        assert_eq!(MemoryRecall::Disabled.count(), 0);
        assert_eq!(MemoryRecall::Degraded("down".into()).count(), 0);
        let recall = MemoryRecall::Retrieved(vec![MemoryRecord::semantic("u", "fact")]);
        assert_eq!(recall.count(), 1);
    }
}
