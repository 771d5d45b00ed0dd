//! Dispatch tests against a real HTTP upstream.
//!
//! These tests spin up a small axum server on a random port that imitates an
//! OpenAI-compatible completions endpoint, so the full reqwest path is
//! exercised without network access.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use relay_common::{Message, RelayError};
use relay_llm::{
    BackendKind, Capability, CompletionOptions, Credentials, Dispatcher, FallbackProfile,
    OpenAiCompatClient, ProviderEntry, ProviderRegistry, RegistryRoles,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorded {
    /// (path, authorization header, request body)
    requests: Mutex<Vec<(String, String, serde_json::Value)>>,
}

impl Recorded {
    fn record(&self, path: &str, headers: &HeaderMap, body: serde_json::Value) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), auth, body));
    }

    fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _, _)| p.clone())
            .collect()
    }
}

async fn ok_handler(
    State(recorded): State<Arc<Recorded>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    recorded.record("/ok", &headers, body);
    Json(serde_json::json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "fallback answer",
                "reasoning_content": "thinking"
            }
        }]
    }))
    .into_response()
}

async fn quota_handler(
    State(recorded): State<Arc<Recorded>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    recorded.record("/quota", &headers, body);
    (
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":{"message":"You exceeded your current quota"}}"#,
    )
        .into_response()
}

async fn boom_handler(
    State(recorded): State<Arc<Recorded>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    recorded.record("/boom", &headers, body);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}

/// Spin up a fake upstream on a random port and return its base URL.
async fn start_upstream(recorded: Arc<Recorded>) -> String {
    let router = Router::new()
        .route("/ok", post(ok_handler))
        .route("/quota", post(quota_handler))
        .route("/boom", post(boom_handler))
        .with_state(recorded);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

fn entry(id: &str, backend: BackendKind, url: String) -> ProviderEntry {
    ProviderEntry {
        id: id.into(),
        name: id.to_uppercase(),
        backend,
        url,
        model: format!("test/{id}"),
        description: String::new(),
        rank: 1,
        capabilities: vec![Capability::General],
    }
}

fn registry(base: &str, primary_path: &str) -> Arc<ProviderRegistry> {
    let entries = vec![
        entry(
            "primary",
            BackendKind::Nvidia,
            format!("{base}{primary_path}"),
        ),
        entry("cheap", BackendKind::OpenRouter, format!("{base}/ok")),
    ];
    let roles = RegistryRoles {
        default: "primary".into(),
        fallback: "cheap".into(),
        vision: "primary".into(),
        coding: "primary".into(),
        fast: "primary".into(),
        reasoning: None,
    };
    Arc::new(ProviderRegistry::new(entries, roles).unwrap())
}

fn dispatcher(registry: Arc<ProviderRegistry>) -> Dispatcher {
    let credentials = Credentials::default()
        .with_key(BackendKind::Nvidia, "nv-key")
        .with_key(BackendKind::OpenRouter, "or-key");
    Dispatcher::new(
        registry,
        Arc::new(credentials),
        Arc::new(OpenAiCompatClient::new()),
        FallbackProfile::default(),
    )
}

fn messages() -> Vec<Message> {
    vec![Message::system("You are a test persona."), Message::user("Hi")]
}

#[tokio::test]
async fn quota_response_triggers_exactly_one_fallback_call() {
    let recorded = Arc::new(Recorded::default());
    let base = start_upstream(recorded.clone()).await;
    let registry = registry(&base, "/quota");
    let primary = registry.lookup("primary").unwrap().clone();

    let dispatched = dispatcher(registry)
        .complete(&primary, messages(), &CompletionOptions::default())
        .await
        .unwrap();

    assert!(dispatched.fell_back);
    assert_eq!(dispatched.served_by.id, "cheap");
    assert_eq!(dispatched.completion.content, "fallback answer");
    assert_eq!(dispatched.completion.reasoning.as_deref(), Some("thinking"));
    assert_eq!(recorded.paths(), vec!["/quota", "/ok"]);

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests[0].1, "Bearer nv-key");
    assert_eq!(requests[0].2["max_tokens"], 10_000);
    assert_eq!(requests[1].1, "Bearer or-key");
    assert_eq!(requests[1].2["model"], "test/cheap");
    assert_eq!(requests[1].2["max_tokens"], 8_000);
    assert!(requests[1].2.get("temperature").is_none());
    assert_eq!(requests[1].2["messages"][0]["content"], "You are Relay.");
}

#[tokio::test]
async fn server_error_is_surfaced_without_retry() {
    let recorded = Arc::new(Recorded::default());
    let base = start_upstream(recorded.clone()).await;
    let registry = registry(&base, "/boom");
    let primary = registry.lookup("primary").unwrap().clone();

    let err = dispatcher(registry)
        .complete(&primary, messages(), &CompletionOptions::default())
        .await
        .unwrap_err();

    match err {
        RelayError::Upstream { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal server error");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(recorded.paths(), vec!["/boom"]);
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop a listener to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let registry = registry(&format!("http://{addr}"), "/ok");
    let primary = registry.lookup("primary").unwrap().clone();

    let err = dispatcher(registry)
        .complete(&primary, messages(), &CompletionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Transport(_)));
}
