// ABOUTME: Shared helpers for integration tests
// ABOUTME: Builds in-memory resources, sessions, and stub upstream servers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

#![allow(missing_docs, clippy::unwrap_used, dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;

use cirrus_chat::config::{LlmConfig, ServerConfig};
use cirrus_chat::database::{Database, UserRecord};
use cirrus_chat::server::ServerResources;

/// Build server resources backed by an in-memory database, pointing the
/// model gateway and weather tool at the given stub base URLs.
pub async fn test_resources(llm_base_url: &str, weather_base_url: &str) -> Arc<ServerResources> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let database = Database::from_pool(pool);
    database.migrate().await.unwrap();

    let config = ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        session_secret: "integration-test-secret".to_owned(),
        session_ttl_secs: 3600,
        llm: LlmConfig {
            api_key: "test-key".to_owned(),
            model: "gemini-1.5-flash".to_owned(),
            base_url: llm_base_url.to_owned(),
        },
        weather_base_url: weather_base_url.to_owned(),
        stream_delay_ms: 1,
        cors_allowed_origin: None,
    };

    Arc::new(ServerResources::new(config, database))
}

/// Resources for tests that never reach the model or weather APIs
pub async fn offline_resources() -> Arc<ServerResources> {
    test_resources("http://127.0.0.1:9", "http://127.0.0.1:9").await
}

/// Create a user and a valid session token for it
pub async fn create_session(
    resources: &Arc<ServerResources>,
    email: &str,
) -> (UserRecord, String) {
    let user = resources
        .auth
        .register(email, "correct horse battery")
        .await
        .unwrap();
    let token = resources.auth.issue_session_token(&user).unwrap();
    (user, token)
}

// ============================================================================
// Stub upstream servers
// ============================================================================

struct StubState {
    bodies: Vec<String>,
    next: AtomicUsize,
}

/// Spawn a router on an ephemeral port, returning its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Spawn a stub model API that answers successive generation requests with
/// the given SSE bodies (the last body repeats if more requests arrive),
/// plus a stub Open-Meteo forecast endpoint.
pub async fn spawn_model_stub(sse_bodies: Vec<String>) -> String {
    let state = Arc::new(StubState {
        bodies: sse_bodies,
        next: AtomicUsize::new(0),
    });

    let router = Router::new()
        .route("/v1beta/models/:model", post(stub_generate))
        .route("/v1/forecast", get(stub_forecast))
        .with_state(state);

    spawn_stub(router).await
}

async fn stub_generate(State(state): State<Arc<StubState>>) -> impl IntoResponse {
    let index = state
        .next
        .fetch_add(1, Ordering::SeqCst)
        .min(state.bodies.len().saturating_sub(1));
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        state.bodies[index].clone(),
    )
}

async fn stub_forecast() -> impl IntoResponse {
    Json(json!({
        "latitude": 48.85,
        "longitude": 2.35,
        "timezone": "Europe/Paris",
        "current": {"time": "2025-06-01T12:00", "temperature_2m": 21.4},
        "hourly": {"time": ["2025-06-01T12:00"], "temperature_2m": [21.4]},
        "daily": {"sunrise": ["2025-06-01T05:50"], "sunset": ["2025-06-01T21:49"]}
    }))
}

// ============================================================================
// SSE body builders for the stub model
// ============================================================================

/// A single-chunk text response ending with a finish reason
pub fn sse_text_body(text: &str) -> String {
    let chunk = json!({
        "candidates": [{
            "content": {"parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 5,
            "candidatesTokenCount": 7,
            "totalTokenCount": 12
        }
    });
    format!("data: {chunk}\n\n")
}

/// A response that requests the weather tool
pub fn sse_tool_call_body(latitude: f64, longitude: f64) -> String {
    let chunk = json!({
        "candidates": [{
            "content": {"parts": [{
                "functionCall": {
                    "name": "get_weather",
                    "args": {"latitude": latitude, "longitude": longitude}
                }
            }]},
            "finishReason": "STOP"
        }]
    });
    format!("data: {chunk}\n\n")
}
