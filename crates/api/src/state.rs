//! Application state for the API server.

use relay_router::{Orchestrator, RelayConfig};
use std::sync::Arc;

/// Shared application state for the API server.
pub struct AppState {
    /// The generation pipeline; also owns the memory store
    pub orchestrator: Arc<Orchestrator>,

    /// Server start time (for health checks)
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state with the given service configuration.
    pub fn new(config: RelayConfig) -> relay_common::Result<Self> {
        Ok(Self::with_orchestrator(Orchestrator::new(config)?))
    }

    pub fn with_orchestrator(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
