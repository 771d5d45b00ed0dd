//! Service configuration.

use relay_llm::{CompletionOptions, CredentialsConfig, FallbackProfile, RegistryConfig};
use relay_memory::MemoryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

pub const DEFAULT_PERSONA: &str =
    "You are Relay, an advanced AI assistant with comprehensive knowledge.";

pub const DEFAULT_MEMORY_GUIDANCE: &str = "You have access to the user's memories. \
Use them to provide personalized responses.\n\
If the user asks about something they've told you before, reference their stored memories.";

/// Main service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Opening of every composed system prompt
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Closing instructions on how to use recalled memories
    #[serde(default = "default_guidance")]
    pub memory_guidance: String,

    /// Sampling for the primary call
    #[serde(default)]
    pub generation: CompletionOptions,

    /// Shape of the single quota fallback retry
    #[serde(default)]
    pub fallback: FallbackProfile,

    /// API keys; unset keys come from the environment
    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    /// Custom provider catalog; the built-in one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryConfig>,
}

fn default_persona() -> String {
    DEFAULT_PERSONA.into()
}

fn default_guidance() -> String {
    DEFAULT_MEMORY_GUIDANCE.into()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            memory_guidance: default_guidance(),
            generation: CompletionOptions::default(),
            fallback: FallbackProfile::default(),
            credentials: CredentialsConfig::default(),
            memory: MemoryConfig::default(),
            registry: None,
        }
    }
}

impl RelayConfig {
    /// Load configuration from a TOML file.
    ///
    /// On Unix the file must be a regular file that is not world-writable,
    /// and a file that sets an API key must not be world-readable.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = Self::from_file_unchecked(path)?;
        let holds_keys = config.credentials.nvidia_api_key.is_some()
            || config.credentials.openrouter_api_key.is_some();

        #[cfg(unix)]
        check_file_mode(path, holds_keys)?;

        if holds_keys {
            warn!(
                path = %path.display(),
                "API key stored in config file; prefer NVIDIA_API_KEY / OPENROUTER_API_KEY"
            );
        }

        Ok(config)
    }

    /// Load configuration from a TOML file without permission checks.
    pub fn from_file_unchecked(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(unix)]
fn check_file_mode(path: &Path, holds_keys: bool) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::symlink_metadata(path)
        .with_context(|| format!("Failed to stat config file '{}'", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("Config path '{}' is not a regular file", path.display());
    }

    let mode = metadata.permissions().mode() & 0o777;
    if mode & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {mode:04o})",
            path.display()
        );
    }
    if holds_keys && mode & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' sets an API key but is world-readable (mode {mode:04o}); run chmod 600",
            path.display()
        );
    }
    Ok(())
}
