//! User memory for Relay.
//!
//! Memories are short facts about a user ("prefers metric units", "has a dog
//! called Pixel") that get injected into the system prompt of later
//! generations. This crate provides:
//!
//! - [`MemoryStore`], the save/fetch/delete capability the pipeline consumes
//! - two stores: [`InMemoryStore`] and the file-backed [`JsonlMemoryStore`]
//! - keyword ranking of memories against the current prompt
//! - [`MemoryExtractor`], which spots "remember that ..." requests
//!
//! ```text
//!   prompt ──► fetch(user, prompt) ──► rank ──► memory block ──► system prompt
//!      │
//!      └────► extract ──► fact ──► save(user, fact, "semantic", 0.8)
//! ```

pub mod extract;
pub mod file;
pub mod retrieval;
pub mod store;
pub mod types;

pub use extract::{Extraction, MemoryExtractor};
pub use file::JsonlMemoryStore;
pub use retrieval::format_memory_block;
pub use store::{InMemoryStore, MemoryStore};
pub use types::{
    ANONYMOUS_USER, DEFAULT_IMPORTANCE, EXTRACTED_IMPORTANCE, MemoryBackend, MemoryConfig,
    MemoryRecord, SEMANTIC,
};

use relay_common::Result;
use std::sync::Arc;
use tracing::info;

/// Build the store selected by `config`.
pub fn build_store(config: &MemoryConfig) -> Result<Arc<dyn MemoryStore>> {
    let store: Arc<dyn MemoryStore> = match &config.backend {
        MemoryBackend::InMemory => {
            info!("Using in-memory store; memories are lost on restart");
            Arc::new(InMemoryStore::new(config.max_results))
        }
        MemoryBackend::Jsonl { path } => {
            Arc::new(JsonlMemoryStore::open(path, config.max_results)?)
        }
    };
    Ok(store)
}
