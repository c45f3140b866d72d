// ABOUTME: Model gateway wrapping the hosted LLM client with shaping middleware
// ABOUTME: Defines chat message, tool, and stream event types shared by routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! LLM provider abstraction.
//!
//! The [`ModelGateway`] wraps the hosted model client ([`gemini`]) behind a
//! response-shaping layer ([`shaping`]) so downstream consumers only ever
//! see cleaned text deltas. Word-level smoothing of the outbound stream
//! lives in [`smooth`] and is applied by the chat route, which owns the
//! pacing of its SSE events.

pub mod gemini;
pub mod shaping;
pub mod smooth;

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LlmConfig;
use crate::errors::AppResult;
use gemini::GeminiClient;
use shaping::ShapingFilter;

// ============================================================================
// Message types
// ============================================================================

/// Role of a message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    /// System instruction
    System,
    /// End-user input (also used for tool results fed back to the model)
    User,
    /// Prior model output
    Assistant,
}

/// One message in a model conversation
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Author role
    pub role: ChatRole,
    /// Plain text content
    pub content: String,
}

impl ChatMessage {
    /// System instruction message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Tool types
// ============================================================================

/// Declaration of one callable function, in the provider's JSON-schema shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// JSON schema for the arguments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// A group of function declarations offered to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// The declared functions
    #[serde(rename = "functionDeclarations")]
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// A function call requested by the model
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// Name of the declared function
    pub name: String,
    /// Arguments as provided by the model
    pub args: Value,
}

// ============================================================================
// Stream events
// ============================================================================

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens billed
    pub total_tokens: u32,
}

/// One event from a streaming generation
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A fragment of response text
    TextDelta(String),
    /// The model requested a tool invocation
    FunctionCall(FunctionCall),
    /// Generation finished
    Finish {
        /// Usage statistics if reported
        usage: Option<TokenUsage>,
        /// Provider finish reason if reported
        finish_reason: Option<String>,
    },
}

// ============================================================================
// Gateway
// ============================================================================

/// Wraps the hosted model client with response-shaping middleware.
///
/// Text deltas pass through a [`ShapingFilter`] which strips synthetic
/// function-call markup and suppresses leading whitespace; function calls
/// and the finish event pass through unchanged (the finish event is
/// re-ordered after any text the filter was still holding).
#[derive(Clone)]
pub struct ModelGateway {
    client: GeminiClient,
    model: String,
}

impl ModelGateway {
    /// Build a gateway from the model provider configuration
    #[must_use]
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: GeminiClient::new(&config.base_url, &config.api_key),
            model: config.model.clone(),
        }
    }

    /// The model identifier requests are sent with
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Stream one generation over the given conversation.
    ///
    /// The returned stream yields shaped [`StreamEvent`]s; a transport or
    /// provider failure surfaces as an `Err` item and ends the stream.
    pub fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<Tool>>,
    ) -> impl Stream<Item = AppResult<StreamEvent>> + Send + 'static {
        let client = self.client.clone();
        let model = self.model.clone();

        async_stream::try_stream! {
            let inner = client.stream_generate(&model, &messages, tools.as_deref()).await?;
            futures_util::pin_mut!(inner);

            let mut shaper = ShapingFilter::new();
            let mut finish: Option<StreamEvent> = None;

            while let Some(event) = inner.next().await {
                match event? {
                    StreamEvent::TextDelta(delta) => {
                        for cleaned in shaper.push(&delta) {
                            yield StreamEvent::TextDelta(cleaned);
                        }
                    }
                    StreamEvent::FunctionCall(call) => {
                        yield StreamEvent::FunctionCall(call);
                    }
                    done @ StreamEvent::Finish { .. } => {
                        finish = Some(done);
                    }
                }
            }

            if let Some(remainder) = shaper.flush() {
                yield StreamEvent::TextDelta(remainder);
            }
            if let Some(done) = finish {
                yield done;
            }
        }
    }
}
