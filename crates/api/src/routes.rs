//! HTTP route handlers for the API.

use crate::AppState;
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use relay_common::RelayError;
use relay_memory::{ANONYMOUS_USER, DEFAULT_IMPORTANCE, MemoryRecord, SEMANTIC};
use relay_router::{FailureKind, GenerationFailure, GenerationRequest, GenerationResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    fn from_store(context: &str, e: RelayError) -> Self {
        error!(error = %e, "{context}");
        let status = match e {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            error: context.to_string(),
            details: Some(e.to_string()),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Map a failure status onto an HTTP status, treating nonsense as a bad gateway.
fn http_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

// ============================================================================
// Chat
// ============================================================================

/// Run one generation.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "Rejected chat body");
            let failure = GenerationFailure {
                kind: FailureKind::InvalidRequest,
                status: 400,
                details: Some(rejection.body_text()),
                setup: None,
            };
            return (StatusCode::BAD_REQUEST, Json(GenerationResponse::from(&failure)))
                .into_response();
        }
    };

    info!(
        user_id = %request.user_id,
        prompt_preview = %request.prompt.chars().take(50).collect::<String>(),
        images = request.images.len(),
        "Received chat request"
    );

    let result = state.orchestrator.generate(&request).await;
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(failure) => http_status(failure.status),
    };

    (status, Json(GenerationResponse::from(&result))).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQuery {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Service description, or a user's memories with `?action=memories`.
pub async fn chat_info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChatQuery>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    if query.action.as_deref() == Some("memories") {
        let user_id = user_or_anonymous(query.user_id.as_deref());
        let memories = state
            .orchestrator
            .memory_store()
            .fetch(user_id, None)
            .await
            .map_err(|e| ErrorResponse::from_store("Failed to load memories", e))?;
        return Ok(Json(serde_json::json!({ "memories": memories })));
    }

    let models: Vec<&str> = state
        .orchestrator
        .registry()
        .entries()
        .iter()
        .map(|e| e.id.as_str())
        .collect();

    Ok(Json(serde_json::json!({
        "name": "Relay Chat API",
        "version": env!("CARGO_PKG_VERSION"),
        "features": [
            "Task-based model routing",
            "Image analysis",
            "Quota fallback",
            "Persistent memory",
            "File context"
        ],
        "models": models,
        "usage": {
            "POST": {
                "prompt": "Your question",
                "userId": "user identifier",
                "model": "optional provider id override",
                "images": ["data URI or URL for images"],
                "enableMemory": true,
                "fileContent": "content from uploaded file",
                "fileName": "filename.md"
            }
        }
    })))
}

// ============================================================================
// Models
// ============================================================================

/// One leaderboard row.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub rank: String,
    pub description: String,
}

/// Provider catalog in registry order.
pub async fn models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelSummary>> {
    let rows = state
        .orchestrator
        .registry()
        .entries()
        .iter()
        .map(|e| ModelSummary {
            id: e.id.clone(),
            name: e.name.clone(),
            provider: e.backend.as_str().to_string(),
            rank: e.rank_label(),
            description: e.description.clone(),
        })
        .collect();
    Json(rows)
}

// ============================================================================
// Memory
// ============================================================================

fn user_or_anonymous(user_id: Option<&str>) -> &str {
    user_id
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(ANONYMOUS_USER)
}

/// Memory save request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMemoryRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub memory_type: Option<String>,
    #[serde(default)]
    pub importance: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct SaveMemoryResponse {
    pub success: bool,
    pub message: &'static str,
    pub memory: MemoryRecord,
}

/// Store a memory directly.
pub async fn save_memory(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SaveMemoryRequest>, JsonRejection>,
) -> Result<Json<SaveMemoryResponse>, ErrorResponse> {
    let Json(request) = body.map_err(|e| ErrorResponse::bad_request(e.body_text()))?;

    let content = request.content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ErrorResponse::bad_request("Content is required"));
    }
    let user_id = user_or_anonymous(request.user_id.as_deref());
    let memory_type = request
        .memory_type
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| SEMANTIC.to_string());

    let memory = state
        .orchestrator
        .memory_store()
        .save(
            user_id,
            &content,
            &memory_type,
            request.importance.unwrap_or(DEFAULT_IMPORTANCE),
        )
        .await
        .map_err(|e| ErrorResponse::from_store("Failed to save memory", e))?;

    info!(user_id = %user_id, memory_id = %memory.id, "Memory saved via API");

    Ok(Json(SaveMemoryResponse {
        success: true,
        message: "Memory saved successfully",
        memory,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

/// List a user's memories, or search them with `?action=search&query=`.
pub async fn list_memories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MemoryQuery>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let user_id = user_or_anonymous(params.user_id.as_deref());
    let store = state.orchestrator.memory_store();

    if params.action.as_deref() == Some("search") {
        let memories = store
            .fetch(user_id, params.query.as_deref())
            .await
            .map_err(|e| ErrorResponse::from_store("Failed to search memories", e))?;
        return Ok(Json(serde_json::json!({ "memories": memories })));
    }

    let memories = store
        .fetch(user_id, None)
        .await
        .map_err(|e| ErrorResponse::from_store("Failed to load memories", e))?;
    Ok(Json(serde_json::json!({
        "count": memories.len(),
        "memories": memories,
        "message": "Use ?action=search&query=term to search memories"
    })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Delete one memory by id.
pub async fn delete_memory(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, ErrorResponse> {
    let Some(id) = params.id.filter(|id| !id.trim().is_empty()) else {
        return Err(ErrorResponse::bad_request("Memory ID is required"));
    };

    let deleted = state
        .orchestrator
        .memory_store()
        .delete(&id)
        .await
        .map_err(|e| ErrorResponse::from_store("Failed to delete memory", e))?;

    debug!(memory_id = %id, deleted, "Delete memory");

    Ok(Json(DeleteResponse {
        success: deleted,
        message: if deleted {
            "Memory deleted"
        } else {
            "Failed to delete memory"
        },
    }))
}
