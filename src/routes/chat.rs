// ABOUTME: Chat route streaming model responses as UI-message SSE events
// ABOUTME: Runs the weather tool loop and persists transcripts after completion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Chat routes.
//!
//! `POST /api/chat` streams a model response for a message list. The
//! response is a Server-Sent-Events stream of UI-message events (`start`,
//! `text-start`/`text-delta`/`text-end`, tool lifecycle events, `finish`,
//! then a `[DONE]` sentinel). Text is re-chunked on word boundaries and
//! paced with a small fixed delay. When the model requests the weather
//! tool, the lookup runs mid-stream and its result is fed back for the
//! next generation turn.
//!
//! Persistence is sequenced strictly after the stream: the transcript is
//! saved once the final event has been emitted, only when the chat id is a
//! syntactically valid UUID, and a save failure is logged rather than
//! surfaced (the stream the client saw has already completed).
//!
//! `DELETE /api/chat?id=` removes an owned chat wholesale.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm::smooth::WordChunker;
use crate::llm::{ChatMessage, FunctionCall, StreamEvent};
use crate::messages::{MessagePart, MessageRole, ToolInvocation, ToolState, UiMessage};
use crate::server::ServerResources;
use crate::tools::{self, weather};

/// Maximum number of tool round-trips before the response is returned as-is
const MAX_TOOL_ITERATIONS: usize = 10;

/// Stream protocol version header expected by the chat UI
const STREAM_PROTOCOL_HEADER: &str = "x-vercel-ai-ui-message-stream";

/// Request body for `POST /api/chat`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Chat identifier chosen by the client (validated before persistence)
    pub id: String,
    /// Conversation so far, in the canonical parts shape
    pub messages: Vec<UiMessage>,
}

/// Query parameters for `DELETE /api/chat`
#[derive(Debug, Deserialize, Default)]
pub struct DeleteChatQuery {
    /// Chat identifier to delete
    pub id: Option<String>,
}

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create the chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::send_message).delete(Self::delete_chat))
            .with_state(resources)
    }

    /// Stream a model response for the submitted conversation
    async fn send_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers)?;

        // Validate the provided id for persistence, but never break streaming.
        let safe_id = valid_chat_id(&request.id);
        if safe_id.is_none() {
            warn!(id = %request.id, "invalid chat id; response will stream without persistence");
        }

        let filtered: Vec<UiMessage> = request
            .messages
            .iter()
            .filter(|m| m.has_renderable_content())
            .cloned()
            .collect();

        let llm_messages = build_llm_messages(&system_prompt(), &filtered);

        let stream = ui_message_stream(
            resources,
            auth.user_id.to_string(),
            safe_id,
            request.messages,
            llm_messages,
        );

        let mut response = Sse::new(stream).into_response();
        response.headers_mut().insert(
            HeaderName::from_static(STREAM_PROTOCOL_HEADER),
            HeaderValue::from_static("v1"),
        );
        Ok(response)
    }

    /// Delete an owned chat
    async fn delete_chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<DeleteChatQuery>,
    ) -> Result<Response, AppError> {
        let Some(id) = query.id else {
            return Err(AppError::not_found("Not Found"));
        };

        let auth = resources.auth.authenticate_request(&headers)?;

        let chat = resources
            .database
            .chats()
            .get_chat(&id)
            .await?
            .ok_or_else(|| AppError::internal(format!("Chat {id} not found during delete")))?;

        if chat.user_id != auth.user_id.to_string() {
            return Err(AppError::auth_invalid("Unauthorized"));
        }

        resources.database.chats().delete_chat(&id).await?;
        info!(chat_id = %id, "chat deleted");

        Ok((StatusCode::OK, "Chat deleted").into_response())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Accept the id for persistence only when it is a syntactically valid v4 UUID
fn valid_chat_id(id: &str) -> Option<String> {
    Uuid::try_parse(id)
        .ok()
        .filter(|u| u.get_version_num() == 4)
        .map(|_| id.to_owned())
}

/// Fixed system prompt, with today's date interpolated
fn system_prompt() -> String {
    format!(
        "You are a helpful AI assistant. You can help users with various tasks and questions.\n\
         - Be concise and helpful in your responses.\n\
         - Today's date is {}.\n\
         - If you don't know something, just say so.\n\
         - You can check the weather for any location if needed.",
        chrono::Utc::now().format("%Y-%m-%d")
    )
}

/// Build the model conversation from the canonical messages.
///
/// Text parts are concatenated per message; tool parts that already carry
/// an output are replayed as tool-result user messages so the model sees
/// earlier lookups. Messages contributing nothing are skipped.
fn build_llm_messages(system_prompt: &str, messages: &[UiMessage]) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    out.push(ChatMessage::system(system_prompt));

    for message in messages {
        let text = message
            .parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        if !text.trim().is_empty() {
            let chat_message = match message.role {
                MessageRole::User => ChatMessage::user(&text),
                MessageRole::Assistant => ChatMessage::assistant(&text),
                MessageRole::System => ChatMessage::system(&text),
                MessageRole::Tool => continue,
            };
            out.push(chat_message);
        }

        for part in &message.parts {
            if let MessagePart::Tool(inv) = part {
                if let Some(ref output) = inv.output {
                    out.push(ChatMessage::user(format!(
                        "[Tool Result for {}]: {output}",
                        inv.tool_name
                    )));
                }
            }
        }
    }

    out
}

/// Build a data-only SSE event from a JSON payload
fn data_event(payload: &serde_json::Value) -> Event {
    Event::default().data(payload.to_string())
}

// ============================================================================
// Stream generation
// ============================================================================

/// Produce the UI-message event stream for one chat turn, persisting the
/// transcript after the final event when a valid chat id was provided.
fn ui_message_stream(
    resources: Arc<ServerResources>,
    user_id: String,
    chat_id: Option<String>,
    original_messages: Vec<UiMessage>,
    mut llm_messages: Vec<ChatMessage>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    let delay = Duration::from_millis(resources.config.stream_delay_ms);

    async_stream::stream! {
        let tools = tools::chat_tools();
        let message_id = Uuid::new_v4().to_string();
        yield Ok::<Event, Infallible>(data_event(&json!({"type": "start", "messageId": &message_id})));

        let mut assistant_parts: Vec<MessagePart> = Vec::new();
        let mut stream_failed = false;

        for iteration in 0..MAX_TOOL_ITERATIONS {
            let mut pending_calls: Vec<FunctionCall> = Vec::new();
            let mut text_block: Option<(String, String)> = None;
            let mut chunker = WordChunker::new();

            let model_stream = resources
                .gateway
                .stream_chat(llm_messages.clone(), Some(tools.clone()));
            futures_util::pin_mut!(model_stream);

            while let Some(event) = model_stream.next().await {
                match event {
                    Ok(StreamEvent::TextDelta(delta)) => {
                        for chunk in chunker.push(&delta) {
                            if text_block.is_none() {
                                let block_id = Uuid::new_v4().to_string();
                                yield Ok(data_event(&json!({"type": "text-start", "id": &block_id})));
                                text_block = Some((block_id, String::new()));
                            }
                            if let Some((block_id, block_text)) = text_block.as_mut() {
                                block_text.push_str(&chunk);
                                sleep(delay).await;
                                yield Ok(data_event(&json!({
                                    "type": "text-delta",
                                    "id": block_id,
                                    "delta": chunk,
                                })));
                            }
                        }
                    }
                    Ok(StreamEvent::FunctionCall(call)) => pending_calls.push(call),
                    Ok(StreamEvent::Finish { .. }) => {}
                    Err(e) => {
                        error!(error = %e, "model stream failed");
                        yield Ok(data_event(&json!({
                            "type": "error",
                            "errorText": "The model stream failed",
                        })));
                        stream_failed = true;
                        break;
                    }
                }
            }

            if !stream_failed {
                if let Some(chunk) = chunker.flush() {
                    if text_block.is_none() {
                        let block_id = Uuid::new_v4().to_string();
                        yield Ok(data_event(&json!({"type": "text-start", "id": &block_id})));
                        text_block = Some((block_id, String::new()));
                    }
                    if let Some((block_id, block_text)) = text_block.as_mut() {
                        block_text.push_str(&chunk);
                        sleep(delay).await;
                        yield Ok(data_event(&json!({
                            "type": "text-delta",
                            "id": block_id,
                            "delta": chunk,
                        })));
                    }
                }
            }

            let mut iteration_text = String::new();
            if let Some((block_id, block_text)) = text_block.take() {
                yield Ok(data_event(&json!({"type": "text-end", "id": &block_id})));
                iteration_text.clone_from(&block_text);
                assistant_parts.push(MessagePart::Text { text: block_text });
            }

            if stream_failed || pending_calls.is_empty() {
                break;
            }

            // Feed the intermediate text back so the model keeps its own
            // words in context across the tool round-trip.
            if !iteration_text.trim().is_empty() {
                llm_messages.push(ChatMessage::assistant(&iteration_text));
            }

            for call in pending_calls {
                let tool_call_id = Uuid::new_v4().to_string();
                info!(tool = %call.name, iteration, "executing tool call");

                yield Ok(data_event(&json!({
                    "type": "tool-input-available",
                    "toolCallId": &tool_call_id,
                    "toolName": &call.name,
                    "input": &call.args,
                })));

                let result = if call.name == weather::TOOL_NAME {
                    resources.weather.execute(&call.args).await
                } else {
                    Err(AppError::invalid_input(format!("Unknown tool: {}", call.name)))
                };

                match result {
                    Ok(output) => {
                        yield Ok(data_event(&json!({
                            "type": "tool-output-available",
                            "toolCallId": &tool_call_id,
                            "output": &output,
                        })));

                        llm_messages.push(ChatMessage::user(format!(
                            "[Tool Result for {}]: {output}",
                            call.name
                        )));
                        assistant_parts.push(MessagePart::Tool(ToolInvocation {
                            tool_name: call.name,
                            tool_call_id,
                            state: ToolState::OutputAvailable,
                            input: Some(call.args),
                            output: Some(output),
                            error_text: None,
                        }));
                    }
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "tool execution failed");
                        let error_text = e.to_string();
                        yield Ok(data_event(&json!({
                            "type": "tool-output-error",
                            "toolCallId": &tool_call_id,
                            "errorText": &error_text,
                        })));

                        llm_messages.push(ChatMessage::user(format!(
                            "[Tool Result for {}]: {}",
                            call.name,
                            json!({"error": &error_text})
                        )));
                        assistant_parts.push(MessagePart::Tool(ToolInvocation {
                            tool_name: call.name,
                            tool_call_id,
                            state: ToolState::OutputError,
                            input: Some(call.args),
                            output: None,
                            error_text: Some(error_text),
                        }));
                    }
                }
            }

            if iteration + 1 == MAX_TOOL_ITERATIONS {
                warn!("tool iteration limit reached; returning response as-is");
            }
        }

        yield Ok(data_event(&json!({"type": "finish"})));
        yield Ok(Event::default().data("[DONE]"));

        // Persistence runs strictly after the stream has completed; failures
        // here are logged and swallowed because the client already has its
        // response.
        if stream_failed {
            return;
        }
        let Some(chat_id) = chat_id else {
            warn!("Skipping chat save: invalid chat id provided");
            return;
        };

        let mut transcript = original_messages;
        transcript.push(UiMessage {
            id: message_id,
            role: MessageRole::Assistant,
            parts: assistant_parts,
        });

        match serde_json::to_string(&transcript) {
            Ok(messages_json) => {
                if let Err(e) = resources
                    .database
                    .chats()
                    .save_chat(&chat_id, &user_id, &messages_json)
                    .await
                {
                    error!(error = %e, chat_id = %chat_id, "Failed to save chat");
                }
            }
            Err(e) => error!(error = %e, "Failed to serialize transcript"),
        }
    }
}
