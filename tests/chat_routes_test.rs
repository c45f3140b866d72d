// ABOUTME: Integration tests for the chat streaming and deletion routes
// ABOUTME: Uses a stub model API and verifies persistence sequencing rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use cirrus_chat::server::router;

fn chat_request(token: &str, chat_id: &str, text: &str) -> Request<Body> {
    let body = json!({
        "id": chat_id,
        "messages": [
            {"id": "m-1", "role": "user", "parts": [{"type": "text", "text": text}]}
        ]
    });
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// POST /api/chat
// ============================================================================

#[tokio::test]
async fn post_without_session_is_unauthorized() {
    let resources = common::offline_resources().await;
    let app = router(resources);

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"id": Uuid::new_v4().to_string(), "messages": []}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_streams_ui_message_events_and_persists() {
    let stub = common::spawn_model_stub(vec![common::sse_text_body("Hello there friend")]).await;
    let resources = common::test_resources(&stub, &stub).await;
    let app = router(resources.clone());

    let (user, token) = common::create_session(&resources, "ada@example.com").await;
    let chat_id = Uuid::new_v4().to_string();

    let response = app
        .oneshot(chat_request(&token, &chat_id, "Say hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-vercel-ai-ui-message-stream")
            .and_then(|v| v.to_str().ok()),
        Some("v1")
    );
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream")));

    let body = body_text(response).await;
    assert!(body.contains("\"type\":\"start\""));
    assert!(body.contains("\"type\":\"text-start\""));
    assert!(body.contains("\"type\":\"text-delta\""));
    assert!(body.contains("\"type\":\"text-end\""));
    assert!(body.contains("\"type\":\"finish\""));
    assert!(body.trim_end().ends_with("data: [DONE]"));

    // Word-chunked deltas: each word arrives as its own event.
    assert!(body.contains("\"delta\":\"Hello \""));
    assert!(body.contains("\"delta\":\"there \""));
    assert!(body.contains("\"delta\":\"friend\""));

    // The transcript was persisted after the stream completed.
    let saved = resources
        .database
        .chats()
        .get_chat(&chat_id)
        .await
        .unwrap()
        .expect("chat should be saved");
    assert_eq!(saved.user_id, user.id);
    assert!(saved.messages.contains("Say hello"));
    assert!(saved.messages.contains("Hello there friend"));
}

#[tokio::test]
async fn post_with_invalid_chat_id_streams_but_does_not_persist() {
    let stub = common::spawn_model_stub(vec![common::sse_text_body("Still streaming")]).await;
    let resources = common::test_resources(&stub, &stub).await;
    let app = router(resources.clone());

    let (user, token) = common::create_session(&resources, "bob@example.com").await;

    let response = app
        .oneshot(chat_request(&token, "definitely-not-a-uuid", "hi"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Still "));
    assert!(body.contains("\"type\":\"finish\""));

    let chats = resources
        .database
        .chats()
        .list_chats_for_user(&user.id)
        .await
        .unwrap();
    assert!(chats.is_empty(), "invalid ids must not be persisted");
}

#[tokio::test]
async fn weather_tool_call_runs_mid_stream() {
    let stub = common::spawn_model_stub(vec![
        common::sse_tool_call_body(48.85, 2.35),
        common::sse_text_body("It is 21.4 degrees in Paris."),
    ])
    .await;
    let resources = common::test_resources(&stub, &stub).await;
    let app = router(resources.clone());

    let (_, token) = common::create_session(&resources, "carol@example.com").await;
    let chat_id = Uuid::new_v4().to_string();

    let response = app
        .oneshot(chat_request(&token, &chat_id, "Weather in Paris?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;

    // Tool lifecycle surfaced to the client.
    assert!(body.contains("\"type\":\"tool-input-available\""));
    assert!(body.contains("\"toolName\":\"get_weather\""));
    assert!(body.contains("\"type\":\"tool-output-available\""));
    assert!(body.contains("temperature_2m"));

    // The follow-up generation produced the final text.
    assert!(body.contains("degrees "));

    // The persisted assistant message carries the tool part and the text.
    let saved = resources
        .database
        .chats()
        .get_chat(&chat_id)
        .await
        .unwrap()
        .unwrap();
    assert!(saved.messages.contains("tool-get_weather"));
    assert!(saved.messages.contains("output-available"));
    assert!(saved.messages.contains("It is 21.4 degrees in Paris."));
}

#[tokio::test]
async fn empty_messages_are_filtered_before_the_model_sees_them() {
    let stub = common::spawn_model_stub(vec![common::sse_text_body("ok")]).await;
    let resources = common::test_resources(&stub, &stub).await;
    let app = router(resources.clone());

    let (_, token) = common::create_session(&resources, "dan@example.com").await;
    let chat_id = Uuid::new_v4().to_string();

    let body = json!({
        "id": chat_id,
        "messages": [
            {"id": "m-0", "role": "user", "parts": [{"type": "text", "text": "   "}]},
            {"id": "m-1", "role": "user", "parts": [{"type": "text", "text": "real question"}]}
        ]
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("\"type\":\"finish\""));
}

// ============================================================================
// DELETE /api/chat
// ============================================================================

#[tokio::test]
async fn delete_without_id_is_not_found() {
    let resources = common::offline_resources().await;
    let app = router(resources);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/chat")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_without_session_is_unauthorized() {
    let resources = common::offline_resources().await;
    let app = router(resources);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/chat?id=some-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_of_non_owned_chat_is_unauthorized() {
    let resources = common::offline_resources().await;
    let app = router(resources.clone());

    let (owner, _) = common::create_session(&resources, "owner@example.com").await;
    let (_, intruder_token) = common::create_session(&resources, "intruder@example.com").await;

    let chat_id = Uuid::new_v4().to_string();
    resources
        .database
        .chats()
        .save_chat(&chat_id, &owner.id, "[]")
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/chat?id={chat_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {intruder_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The chat is still there.
    assert!(resources
        .database
        .chats()
        .get_chat(&chat_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn delete_of_owned_chat_succeeds() {
    let resources = common::offline_resources().await;
    let app = router(resources.clone());

    let (owner, token) = common::create_session(&resources, "owner@example.com").await;
    let chat_id = Uuid::new_v4().to_string();
    resources
        .database
        .chats()
        .save_chat(&chat_id, &owner.id, "[]")
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/chat?id={chat_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Chat deleted");

    assert!(resources
        .database
        .chats()
        .get_chat(&chat_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn delete_of_missing_chat_is_an_internal_error() {
    let resources = common::offline_resources().await;
    let app = router(resources.clone());

    let (_, token) = common::create_session(&resources, "owner@example.com").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/chat?id={}", Uuid::new_v4()))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
