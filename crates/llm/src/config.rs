use relay_common::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::registry::BackendKind;

/// API keys as written in a configuration file.
///
/// Any key left unset is read from the backend's environment variable
/// (`NVIDIA_API_KEY`, `OPENROUTER_API_KEY`) when resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nvidia_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openrouter_api_key: Option<String>,
}

impl CredentialsConfig {
    fn configured(&self, backend: BackendKind) -> Option<&String> {
        match backend {
            BackendKind::Nvidia => self.nvidia_api_key.as_ref(),
            BackendKind::OpenRouter => self.openrouter_api_key.as_ref(),
        }
    }

    /// Resolve keys for every backend.
    ///
    /// Priority:
    /// 1. Explicit key in config
    /// 2. The backend's environment variable
    pub fn resolve(&self) -> Credentials {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve keys using `lookup` in place of the process environment.
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Credentials {
        let mut credentials = Credentials::default();
        for backend in [BackendKind::Nvidia, BackendKind::OpenRouter] {
            let key = self
                .configured(backend)
                .cloned()
                .filter(|k| !k.trim().is_empty())
                .or_else(|| lookup(backend.env_var()));
            if let Some(key) = key {
                credentials = credentials.with_key(backend, key);
            }
        }
        credentials
    }
}

/// Resolved API keys, one per backend kind.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<BackendKind, String>,
}

impl Credentials {
    /// Empty or whitespace-only keys are treated as missing.
    pub fn with_key(mut self, backend: BackendKind, key: impl Into<String>) -> Self {
        let key = key.into();
        if key.trim().is_empty() {
            self.keys.remove(&backend);
        } else {
            self.keys.insert(backend, key);
        }
        self
    }

    pub fn get(&self, backend: BackendKind) -> Option<&str> {
        self.keys.get(&backend).map(String::as_str)
    }

    pub fn has(&self, backend: BackendKind) -> bool {
        self.keys.contains_key(&backend)
    }

    /// The key for `backend`, or a `MissingCredential` error naming the
    /// environment variable to set.
    pub fn require(&self, backend: BackendKind) -> Result<&str> {
        self.get(backend)
            .ok_or_else(|| RelayError::MissingCredential {
                backend: backend.to_string(),
                env_var: backend.env_var(),
            })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut configured: Vec<&str> = self.keys.keys().map(|b| b.as_str()).collect();
        configured.sort_unstable();
        f.debug_struct("Credentials")
            .field("configured", &configured)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_CONFIG: &str = r#"
nvidia_api_key = "nv-test"
"#;

    #[test]
    fn deserialize_config_from_toml() {
        let config: CredentialsConfig = toml::from_str(TOML_CONFIG).unwrap();
        assert_eq!(config.nvidia_api_key.as_deref(), Some("nv-test"));
        assert!(config.openrouter_api_key.is_none());
    }

    #[test]
    fn config_key_wins_over_environment() {
        let config: CredentialsConfig = toml::from_str(TOML_CONFIG).unwrap();
        let credentials = config.resolve_with(|var| match var {
            "NVIDIA_API_KEY" => Some("from-env".into()),
            "OPENROUTER_API_KEY" => Some("or-env".into()),
            _ => None,
        });
        assert_eq!(credentials.get(BackendKind::Nvidia), Some("nv-test"));
        assert_eq!(credentials.get(BackendKind::OpenRouter), Some("or-env"));
    }

    #[test]
    fn blank_config_key_falls_back_to_environment() {
        let config = CredentialsConfig {
            nvidia_api_key: Some("   ".into()),
            openrouter_api_key: None,
        };
        let credentials = config.resolve_with(|var| {
            (var == "NVIDIA_API_KEY").then(|| "from-env".to_string())
        });
        assert_eq!(credentials.get(BackendKind::Nvidia), Some("from-env"));
        assert!(!credentials.has(BackendKind::OpenRouter));
    }

    #[test]
    fn empty_environment_value_is_missing() {
        let credentials = CredentialsConfig::default().resolve_with(|_| Some(String::new()));
        assert!(!credentials.has(BackendKind::Nvidia));
        assert!(!credentials.has(BackendKind::OpenRouter));
    }

    #[test]
    fn require_names_env_var() {
        let credentials = Credentials::default().with_key(BackendKind::Nvidia, "nv");
        assert_eq!(credentials.require(BackendKind::Nvidia).unwrap(), "nv");

        let err = credentials.require(BackendKind::OpenRouter).unwrap_err();
        match err {
            RelayError::MissingCredential { env_var, .. } => {
                assert_eq!(env_var, "OPENROUTER_API_KEY")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn debug_does_not_leak_keys() {
        let credentials = Credentials::default().with_key(BackendKind::OpenRouter, "sk-secret");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("openrouter"));
        assert!(!rendered.contains("sk-secret"));
    }
}
