// ABOUTME: Canonical chat message model and legacy-shape normalization
// ABOUTME: Converts historical storage shapes into the part-indexed UiMessage form
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Message model and normalization.
//!
//! Transcripts have been persisted in three shapes over time: a raw content
//! string, a content array, and the current parts array. Everything read
//! from storage is normalized to the parts shape before display; only the
//! parts shape is written going forward.
//!
//! Normalization is total: unrecognized records degrade to an empty text
//! part rather than raising. Messages with the `tool` role are dropped
//! during normalization (they were an internal bookkeeping shape and are
//! not independently renderable).

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Fallback display title for chats without a leading text part
pub const UNTITLED: &str = "Untitled";

// ============================================================================
// Roles
// ============================================================================

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End-user turn
    User,
    /// Model turn
    Assistant,
    /// System instruction
    System,
    /// Tool bookkeeping (legacy; dropped during normalization)
    Tool,
}

impl MessageRole {
    /// Parse a stored role string; unrecognized values degrade to `user`
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "assistant" => Self::Assistant,
            "system" => Self::System,
            "tool" => Self::Tool,
            _ => Self::User,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

// ============================================================================
// Parts
// ============================================================================

/// Lifecycle state of a tool invocation part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    /// The model is still streaming the tool input
    InputStreaming,
    /// Input is complete; the tool is executing
    InputAvailable,
    /// The tool produced an output payload
    OutputAvailable,
    /// The tool failed; `error_text` carries the reason
    OutputError,
}

impl ToolState {
    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputStreaming => "input-streaming",
            Self::InputAvailable => "input-available",
            Self::OutputAvailable => "output-available",
            Self::OutputError => "output-error",
        }
    }
}

/// A tool invocation tracked through its lifecycle
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Tool name, e.g. `get_weather`
    pub tool_name: String,
    /// Provider-assigned or generated call identifier
    pub tool_call_id: String,
    /// Lifecycle state
    pub state: ToolState,
    /// Input payload once available
    pub input: Option<Value>,
    /// Output payload once available
    pub output: Option<Value>,
    /// Error text when the invocation failed
    pub error_text: Option<String>,
}

/// One renderable unit of a message
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    /// Markdown-capable text block
    Text {
        /// The text content
        text: String,
    },
    /// Attached file reference
    File {
        /// Location of the file
        url: String,
        /// Media type, e.g. `image/png`
        media_type: String,
    },
    /// Tool invocation with lifecycle state
    Tool(ToolInvocation),
}

impl MessagePart {
    /// Convenience constructor for a text part
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Coerce an arbitrary stored part value into a part.
    ///
    /// Total: values that match no known part shape become an empty text
    /// part. Tool parts are recognized by the `tool-` type prefix; a tool
    /// part with an unknown state is classified by whether an output is
    /// present.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let part_type = value.get("type").and_then(Value::as_str).unwrap_or("");

        if part_type == "text" {
            let text = value
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Self::text(text);
        }

        if part_type == "file" {
            let url = value.get("url").and_then(Value::as_str).unwrap_or_default();
            let media_type = value
                .get("mediaType")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Self::File {
                url: url.to_owned(),
                media_type: media_type.to_owned(),
            };
        }

        if let Some(tool_name) = part_type.strip_prefix("tool-") {
            let input = value.get("input").cloned().filter(|v| !v.is_null());
            let output = value.get("output").cloned().filter(|v| !v.is_null());
            let error_text = value
                .get("errorText")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned);

            let state = match value.get("state").and_then(Value::as_str) {
                Some("input-streaming") => ToolState::InputStreaming,
                Some("input-available") => ToolState::InputAvailable,
                Some("output-available") => ToolState::OutputAvailable,
                Some("output-error") => ToolState::OutputError,
                _ if output.is_some() => ToolState::OutputAvailable,
                _ => ToolState::InputAvailable,
            };

            return Self::Tool(ToolInvocation {
                tool_name: tool_name.to_owned(),
                tool_call_id: value
                    .get("toolCallId")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                state,
                input,
                output,
                error_text,
            });
        }

        Self::text("")
    }
}

impl Serialize for MessagePart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text { text } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "text")?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            Self::File { url, media_type } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "file")?;
                map.serialize_entry("url", url)?;
                map.serialize_entry("mediaType", media_type)?;
                map.end()
            }
            Self::Tool(inv) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", &format!("tool-{}", inv.tool_name))?;
                map.serialize_entry("toolCallId", &inv.tool_call_id)?;
                map.serialize_entry("state", inv.state.as_str())?;
                if let Some(ref input) = inv.input {
                    map.serialize_entry("input", input)?;
                }
                if let Some(ref output) = inv.output {
                    map.serialize_entry("output", output)?;
                }
                if let Some(ref error_text) = inv.error_text {
                    map.serialize_entry("errorText", error_text)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for MessagePart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Canonical part-indexed chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiMessage {
    /// Stable message identifier (generated when the stored record lacks one)
    #[serde(default)]
    pub id: String,
    /// Author role
    pub role: MessageRole,
    /// Ordered renderable parts
    pub parts: Vec<MessagePart>,
}

impl UiMessage {
    /// Create a message with a fresh identifier
    #[must_use]
    pub fn new(role: MessageRole, parts: Vec<MessagePart>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts,
        }
    }

    /// Whether the message carries anything worth sending to the model:
    /// non-blank text, a file reference, or a tool invocation with a payload
    #[must_use]
    pub fn has_renderable_content(&self) -> bool {
        self.parts.iter().any(|part| match part {
            MessagePart::Text { text } => !text.trim().is_empty(),
            MessagePart::File { .. } => true,
            MessagePart::Tool(inv) => inv.input.is_some() || inv.output.is_some(),
        })
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize one stored message record to the canonical shape.
///
/// Returns `None` only for `tool`-role records, which are dropped from
/// display. Shape checks run in order: an existing `parts` array passes
/// through, a scalar `content` string becomes one text part, and anything
/// else is coerced (array element-wise, otherwise a single empty text
/// part). Never fails.
#[must_use]
pub fn normalize_stored_message(value: &Value) -> Option<UiMessage> {
    let role_raw = value.get("role").and_then(Value::as_str).unwrap_or("user");
    let role = MessageRole::parse(role_raw);
    if role == MessageRole::Tool {
        return None;
    }

    let id = value
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    let parts = if let Some(parts) = value.get("parts").and_then(Value::as_array) {
        parts.iter().map(MessagePart::from_value).collect()
    } else if let Some(text) = value.get("content").and_then(Value::as_str) {
        vec![MessagePart::text(text)]
    } else if let Some(items) = value.get("content").and_then(Value::as_array) {
        items.iter().map(MessagePart::from_value).collect()
    } else {
        vec![MessagePart::text("")]
    };

    Some(UiMessage { id, role, parts })
}

/// Normalize a full stored transcript, dropping `tool`-role records
#[must_use]
pub fn convert_to_ui_messages(records: &[Value]) -> Vec<UiMessage> {
    records.iter().filter_map(normalize_stored_message).collect()
}

/// Parse the raw `messages` column into a list of stored records.
///
/// The oldest rows stored the transcript double-encoded (a JSON string
/// containing JSON); those are unwrapped one level. Anything that does not
/// end up as an array yields an empty transcript.
#[must_use]
pub fn parse_stored_transcript(raw: &str) -> Vec<Value> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return Vec::new(),
    };

    let unwrapped = match parsed {
        Value::String(inner) => match serde_json::from_str(&inner) {
            Ok(value) => value,
            Err(_) => return Vec::new(),
        },
        other => other,
    };

    match unwrapped {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

// ============================================================================
// Title derivation
// ============================================================================

/// Derive a display title for a chat: the text of the first text-typed part
/// of the first message, or [`UNTITLED`] when no such part exists.
///
/// Display-only; not unique and never persisted.
#[must_use]
pub fn derive_chat_title(messages: &[UiMessage]) -> String {
    messages
        .first()
        .and_then(|message| {
            message.parts.iter().find_map(|part| match part {
                MessagePart::Text { text } => Some(text.clone()),
                _ => None,
            })
        })
        .unwrap_or_else(|| UNTITLED.to_owned())
}
