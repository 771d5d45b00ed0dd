//! Route decision types.

use relay_llm::ProviderEntry;
use serde::{Deserialize, Serialize};

/// Task categories recognized by keyword classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Coding,
    Reasoning,
    Fast,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coding => "coding",
            Self::Reasoning => "reasoning",
            Self::Fast => "fast",
        }
    }
}

/// How a provider was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "task")]
pub enum RouteSource {
    /// The request named a known provider id
    Override,
    /// The request carried images
    Vision,
    /// A keyword rule matched
    Keyword(TaskKind),
    /// Nothing matched
    Default,
}

/// The result of classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    /// The chosen provider
    pub provider: ProviderEntry,

    pub source: RouteSource,

    /// Keyword that triggered a `Keyword` route
    #[serde(default)]
    pub matched_keyword: Option<String>,

    /// Reasoning for the decision
    pub reasoning: String,
}

impl RouteDecision {
    pub fn overridden(provider: ProviderEntry) -> Self {
        let reasoning = format!("Provider '{}' requested explicitly", provider.id);
        Self {
            provider,
            source: RouteSource::Override,
            matched_keyword: None,
            reasoning,
        }
    }

    pub fn vision(provider: ProviderEntry) -> Self {
        Self {
            provider,
            source: RouteSource::Vision,
            matched_keyword: None,
            reasoning: "Request carries images".into(),
        }
    }

    pub fn keyword(provider: ProviderEntry, task: TaskKind, keyword: &str) -> Self {
        Self {
            provider,
            source: RouteSource::Keyword(task),
            matched_keyword: Some(keyword.to_string()),
            reasoning: format!("Detected {} request (\"{}\")", task.as_str(), keyword),
        }
    }

    pub fn default_route(provider: ProviderEntry) -> Self {
        Self {
            provider,
            source: RouteSource::Default,
            matched_keyword: None,
            reasoning: "No task keywords, using the default provider".into(),
        }
    }
}
