//! Routing and the generation pipeline for Relay.
//!
//! ```text
//! GenerationRequest
//!      │
//!      ▼
//! ┌────────────────┐   override / images / keywords
//! │ TaskClassifier │ ─────────────────────────────► ProviderEntry
//! └───────┬────────┘
//!         ▼
//! ┌────────────────┐  fetch   ┌─────────────┐
//! │  Orchestrator  │ ───────► │ MemoryStore │
//! │                │ ◄─ save ─│             │
//! └───────┬────────┘          └─────────────┘
//!         ▼
//!    Dispatcher ──► primary ──(quota)──► fallback
//! ```

pub mod classifier;
pub mod config;
pub mod generation;
pub mod orchestrator;
pub mod routing;

pub use classifier::{ClassificationRule, TaskClassifier};
pub use config::RelayConfig;
pub use generation::{
    FailureKind, GenerationFailure, GenerationOutput, GenerationRequest, GenerationResponse,
    GenerationResult, MemoryRecall, MemoryWrite,
};
pub use orchestrator::{Orchestrator, PromptTemplate};
pub use routing::{RouteDecision, RouteSource, TaskKind};
