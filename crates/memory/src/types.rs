//! Memory types and configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// User id applied when a request does not name one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Type tag for facts about the user.
pub const SEMANTIC: &str = "semantic";

/// Importance given to records saved without an explicit score.
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

/// Importance given to facts the user explicitly asked to remember.
pub const EXTRACTED_IMPORTANCE: f32 = 0.8;

/// A small persisted fact about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique ID
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// The actual content
    pub content: String,

    /// Free-form type tag, e.g. "semantic"
    pub memory_type: String,

    /// Importance score (0.0 - 1.0)
    #[serde(default = "default_importance")]
    pub importance: f32,

    pub created_at: DateTime<Utc>,
}

fn default_importance() -> f32 {
    DEFAULT_IMPORTANCE
}

impl MemoryRecord {
    pub fn new(
        user_id: impl Into<String>,
        content: impl Into<String>,
        memory_type: impl Into<String>,
        importance: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            content: content.into(),
            memory_type: memory_type.into(),
            importance: clamp_importance(importance),
            created_at: Utc::now(),
        }
    }

    pub fn semantic(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(user_id, content, SEMANTIC, DEFAULT_IMPORTANCE)
    }
}

/// Clamp to [0, 1]; NaN becomes the default importance.
pub fn clamp_importance(importance: f32) -> f32 {
    if importance.is_nan() {
        DEFAULT_IMPORTANCE
    } else {
        importance.clamp(0.0, 1.0)
    }
}

/// Where memories are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum MemoryBackend {
    /// Process-local, lost on restart
    InMemory,
    /// Append-only JSON lines file
    Jsonl { path: PathBuf },
}

/// Configuration for the memory system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(flatten)]
    pub backend: MemoryBackend,

    /// Maximum memories returned by a fetch
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackend::InMemory,
            max_results: default_max_results(),
        }
    }
}
