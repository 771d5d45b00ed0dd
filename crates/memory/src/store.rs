//! Memory store capability and the in-process implementation.

use crate::retrieval;
use crate::types::{MemoryRecord, clamp_importance};
use async_trait::async_trait;
use relay_common::{RelayError, Result};
use tokio::sync::RwLock;
use tracing::debug;

/// Save/fetch/delete operations the generation pipeline relies on.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Memories owned by `user_id`, ranked against `query` when one is given.
    async fn fetch(&self, user_id: &str, query: Option<&str>) -> Result<Vec<MemoryRecord>>;

    async fn save(
        &self,
        user_id: &str,
        content: &str,
        memory_type: &str,
        importance: f32,
    ) -> Result<MemoryRecord>;

    /// Returns `false` if no record had that id.
    async fn delete(&self, id: &str) -> Result<bool>;
}

pub(crate) fn validate_content(content: &str) -> Result<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(RelayError::InvalidRequest("Content is required".into()));
    }
    Ok(trimmed)
}

/// Memory store kept entirely in process memory.
pub struct InMemoryStore {
    records: RwLock<Vec<MemoryRecord>>,
    max_results: usize,
}

impl InMemoryStore {
    pub fn new(max_results: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            max_results,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn fetch(&self, user_id: &str, query: Option<&str>) -> Result<Vec<MemoryRecord>> {
        let owned: Vec<MemoryRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();

        let ranked = retrieval::rank(owned, query, self.max_results);
        debug!(user_id = %user_id, count = ranked.len(), "Fetched memories");
        Ok(ranked)
    }

    async fn save(
        &self,
        user_id: &str,
        content: &str,
        memory_type: &str,
        importance: f32,
    ) -> Result<MemoryRecord> {
        let content = validate_content(content)?;
        let record = MemoryRecord::new(
            user_id,
            content,
            memory_type,
            clamp_importance(importance),
        );

        debug!(
            memory_id = %record.id,
            user_id = %user_id,
            memory_type = %memory_type,
            "Saving memory"
        );

        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|m| m.id != id);
        Ok(records.len() != before)
    }
}
