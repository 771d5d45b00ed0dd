//! Static catalog of completion providers.
//!
//! The registry is built once at start-up and shared read-only. Each entry
//! names a backend, and a small set of roles designates which entry serves
//! vision requests, quota fallbacks, coding prompts and so on.

use relay_common::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const NVIDIA_URL: &str = "https://integrate.api.nvidia.com/v1/chat/completions";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Credentialed third-party completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Nvidia,
    OpenRouter,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nvidia => "nvidia",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Environment variable holding this backend's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Nvidia => "NVIDIA_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Headers this backend expects on top of bearer auth.
    pub fn extra_headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Nvidia => &[("ngrok-skip-browser-warning", "true")],
            Self::OpenRouter => &[],
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a provider is good at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    General,
    Coding,
    Reasoning,
    Fast,
    Vision,
}

/// A single model backend the service can route to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Unique key, also accepted as an explicit override on requests
    pub id: String,

    /// Display name reported back to callers
    pub name: String,

    pub backend: BackendKind,

    /// Chat completions endpoint
    pub url: String,

    /// Backend-specific model name
    pub model: String,

    #[serde(default)]
    pub description: String,

    /// Relative capacity, used only for display
    #[serde(default)]
    pub rank: u32,

    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl ProviderEntry {
    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    /// Display label for the rank, e.g. `#913B`.
    pub fn rank_label(&self) -> String {
        format!("#{}B", self.rank)
    }
}

/// Entry ids designated for each routing role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRoles {
    /// Used when classification finds nothing more specific
    pub default: String,

    /// Low-cost target for quota-exhaustion retries
    pub fallback: String,

    /// Used whenever a request carries images
    pub vision: String,

    pub coding: String,

    pub fast: String,

    /// Defaults to the fallback target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Serialized form of a registry, as found in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub providers: Vec<ProviderEntry>,
    pub roles: RegistryRoles,
}

/// Positions in `entries` of each role's provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RoleSlots {
    default: usize,
    fallback: usize,
    vision: usize,
    coding: usize,
    fast: usize,
    reasoning: usize,
}

/// Read-only catalog of providers in declaration order.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
    roles: RegistryRoles,
    slots: RoleSlots,
}

impl ProviderRegistry {
    /// Build a registry, validating ids and role assignments.
    pub fn new(entries: Vec<ProviderEntry>, roles: RegistryRoles) -> Result<Self> {
        if entries.is_empty() {
            return Err(RelayError::Config(
                "Provider registry must contain at least one entry".into(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(RelayError::Config(format!(
                    "Duplicate provider id: {}",
                    entry.id
                )));
            }
        }

        let slots = resolve_slots(&entries, &roles)?;
        Ok(Self {
            entries,
            roles,
            slots,
        })
    }

    pub fn from_config(config: RegistryConfig) -> Result<Self> {
        Self::new(config.providers, config.roles)
    }

    /// The catalog the service ships with.
    pub fn builtin() -> Self {
        let entry = |id: &str,
                     name: &str,
                     backend: BackendKind,
                     model: &str,
                     description: &str,
                     rank: u32,
                     capabilities: &[Capability]| {
            ProviderEntry {
                id: id.into(),
                name: name.into(),
                backend,
                url: match backend {
                    BackendKind::Nvidia => NVIDIA_URL.into(),
                    BackendKind::OpenRouter => OPENROUTER_URL.into(),
                },
                model: model.into(),
                description: description.into(),
                rank,
                capabilities: capabilities.to_vec(),
            }
        };

        let entries = vec![
            entry(
                "tier1",
                "Kimi K2.5",
                BackendKind::Nvidia,
                "moonshotai/kimi-k2-instruct",
                "#1 Model - Best Overall",
                913,
                &[Capability::General],
            ),
            entry(
                "tier2",
                "Trinity Large",
                BackendKind::OpenRouter,
                "arcee-ai/trinity-large",
                "#2 Model - Great Reasoning",
                534,
                &[Capability::Reasoning],
            ),
            entry(
                "tier3",
                "Gemini 3 Flash",
                BackendKind::OpenRouter,
                "google/gemini-3-flash-preview",
                "#3 Model - Fast & Smart",
                470,
                &[Capability::Coding, Capability::Fast],
            ),
            entry(
                "tier4",
                "Step 3.5 Flash",
                BackendKind::OpenRouter,
                "stepfun/Step-3.5-Flash",
                "#4 Model - Free Tier",
                443,
                &[Capability::Coding],
            ),
            entry(
                "tier5",
                "MiniMax M2.5",
                BackendKind::OpenRouter,
                "minimax/M2.5",
                "#5 Model - Versatile",
                414,
                &[Capability::General],
            ),
            entry(
                "fallback",
                "DeepSeek R1",
                BackendKind::OpenRouter,
                "deepseek/deepseek-r1",
                "Reasoning Model",
                100,
                &[Capability::Reasoning],
            ),
            entry(
                "vision",
                "Molmo 7B",
                BackendKind::OpenRouter,
                "allenai/molmo-7b-d:free",
                "Image Analysis",
                50,
                &[Capability::Vision],
            ),
        ];

        Self {
            entries,
            roles: RegistryRoles {
                default: "tier1".into(),
                fallback: "fallback".into(),
                vision: "vision".into(),
                coding: "tier3".into(),
                fast: "tier3".into(),
                reasoning: None,
            },
            slots: RoleSlots {
                default: 0,
                fallback: 5,
                vision: 6,
                coding: 2,
                fast: 2,
                reasoning: 5,
            },
        }
    }

    pub fn lookup(&self, id: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn roles(&self) -> &RegistryRoles {
        &self.roles
    }

    pub fn default_entry(&self) -> &ProviderEntry {
        &self.entries[self.slots.default]
    }

    pub fn fallback_target(&self) -> &ProviderEntry {
        &self.entries[self.slots.fallback]
    }

    pub fn vision_target(&self) -> &ProviderEntry {
        &self.entries[self.slots.vision]
    }

    pub fn coding_target(&self) -> &ProviderEntry {
        &self.entries[self.slots.coding]
    }

    pub fn fast_target(&self) -> &ProviderEntry {
        &self.entries[self.slots.fast]
    }

    /// Falls back to the fallback target when no reasoning role is set.
    pub fn reasoning_target(&self) -> &ProviderEntry {
        &self.entries[self.slots.reasoning]
    }
}

fn resolve_slots(entries: &[ProviderEntry], roles: &RegistryRoles) -> Result<RoleSlots> {
    let position = |role: &str, id: &str| {
        entries.iter().position(|e| e.id == id).ok_or_else(|| {
            RelayError::Config(format!("Role '{role}' refers to unknown provider '{id}'"))
        })
    };

    let fallback = position("fallback", &roles.fallback)?;
    Ok(RoleSlots {
        default: position("default", &roles.default)?,
        fallback,
        vision: position("vision", &roles.vision)?,
        coding: position("coding", &roles.coding)?,
        fast: position("fast", &roles.fast)?,
        reasoning: match roles.reasoning {
            Some(ref id) => position("reasoning", id)?,
            None => fallback,
        },
    })
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
