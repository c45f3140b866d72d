// ABOUTME: Streaming client for the Gemini generateContent API
// ABOUTME: Consumes the provider's SSE stream and maps chunks to StreamEvents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Gemini streaming client.
//!
//! Talks to `models/{model}:streamGenerateContent?alt=sse` and converts the
//! provider's chunked `GenerateContentResponse` events into the crate's
//! [`StreamEvent`] shape. The base URL is configurable so tests can point
//! the client at a local stub.

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppResult};

use super::{ChatMessage, ChatRole, FunctionCall, StreamEvent, TokenUsage, Tool};

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ContentPayload>,
    contents: Vec<ContentPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
}

#[derive(Serialize)]
struct ContentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<FunctionCallPayload>,
}

#[derive(Deserialize)]
struct FunctionCallPayload {
    name: String,
    args: Option<Value>,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u32,
}

// ============================================================================
// Client
// ============================================================================

impl GeminiClient {
    /// Create a client for the given endpoint and API key
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        }
    }

    /// Open a streaming generation request.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be sent or the provider
    /// responds with a non-success status. Mid-stream failures surface as
    /// `Err` items on the returned stream.
    pub async fn stream_generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> AppResult<impl Stream<Item = AppResult<StreamEvent>> + Send> {
        let body = build_request(messages, tools);
        let url = format!(
            "{}/v1beta/models/{model}:streamGenerateContent?alt=sse",
            self.base_url
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Model request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(format!(
                "Model provider returned {status}: {detail}"
            )));
        }

        let events = response.bytes_stream().eventsource();

        Ok(async_stream::try_stream! {
            futures_util::pin_mut!(events);
            while let Some(event) = events.next().await {
                let event = event
                    .map_err(|e| AppError::external_service(format!("Model stream error: {e}")))?;

                // Some SSE implementations terminate with a sentinel line.
                if event.data.trim() == "[DONE]" {
                    break;
                }

                let chunk: StreamChunk = serde_json::from_str(&event.data).map_err(|e| {
                    AppError::external_service(format!("Malformed model stream chunk: {e}"))
                })?;

                for item in chunk_events(chunk) {
                    yield item;
                }
            }
        })
    }
}

/// Build the provider request body from the conversation.
///
/// System messages are folded into the `systemInstruction` field; the
/// assistant role maps to the provider's `model` role.
fn build_request<'a>(messages: &[ChatMessage], tools: Option<&'a [Tool]>) -> GenerateRequest<'a> {
    let system_text: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .collect();

    let system_instruction = if system_text.is_empty() {
        None
    } else {
        Some(ContentPayload {
            role: None,
            parts: vec![TextPart {
                text: system_text.join("\n\n"),
            }],
        })
    };

    let contents = messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| ContentPayload {
            role: Some(match m.role {
                ChatRole::Assistant => "model",
                _ => "user",
            }),
            parts: vec![TextPart {
                text: m.content.clone(),
            }],
        })
        .collect();

    GenerateRequest {
        system_instruction,
        contents,
        tools,
    }
}

/// Flatten one provider chunk into stream events
fn chunk_events(chunk: StreamChunk) -> Vec<StreamEvent> {
    let mut out = Vec::new();
    let usage = chunk.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    for candidate in chunk.candidates {
        if let Some(content) = candidate.content {
            for part in content.parts {
                if let Some(text) = part.text {
                    if !text.is_empty() {
                        out.push(StreamEvent::TextDelta(text));
                    }
                }
                if let Some(call) = part.function_call {
                    out.push(StreamEvent::FunctionCall(FunctionCall {
                        name: call.name,
                        args: call.args.unwrap_or_else(|| Value::Object(Default::default())),
                    }));
                }
            }
        }

        if let Some(reason) = candidate.finish_reason {
            out.push(StreamEvent::Finish {
                usage,
                finish_reason: Some(reason),
            });
        }
    }

    out
}
