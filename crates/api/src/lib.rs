//! REST API for Relay.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/chat` - Run a generation
//! - `GET /api/chat` - Service description, or `?action=memories&userId=`
//! - `GET /api/models` - Provider leaderboard
//! - `POST /api/memory` - Save a memory
//! - `GET /api/memory` - List memories, or `?action=search&query=`
//! - `DELETE /api/memory?id=` - Delete a memory
//!
//! Request bodies are capped at 10 MiB so data-URI images fit, and every
//! request is bounded by a timeout.
//!
//! # Architecture
//!
//! ```text
//! Client
//!    │
//!    ▼
//! ┌─────────────────┐
//! │   API Gateway   │ ◄── This crate
//! │     (Axum)      │
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐      ┌─────────────┐
//! │  Orchestrator   │ ───► │ MemoryStore │
//! └────────┬────────┘      └─────────────┘
//!          ▼
//!   NVIDIA / OpenRouter
//! ```

pub mod routes;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use state::AppState;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Upper bound on a single request, including upstream calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/chat", get(routes::chat_info).post(routes::chat))
        .route("/api/models", get(routes::models))
        .route(
            "/api/memory",
            get(routes::list_memories)
                .post(routes::save_memory)
                .delete(routes::delete_memory),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let router = create_router(state);

    info!(%addr, "Starting Relay API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
