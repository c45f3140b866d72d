// ABOUTME: Property tests for legacy message-shape normalization
// ABOUTME: Exercises the three storage shapes, degradation, and title derivation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

#![allow(missing_docs, clippy::unwrap_used)]

use cirrus_chat::messages::{
    convert_to_ui_messages, derive_chat_title, normalize_stored_message, parse_stored_transcript,
    MessagePart, MessageRole, ToolState, UiMessage, UNTITLED,
};
use serde_json::{json, Value};

#[test]
fn raw_content_string_shape() {
    let record = json!({"role": "user", "content": "hello"});
    let message = normalize_stored_message(&record).unwrap();

    assert_eq!(message.role, MessageRole::User);
    assert_eq!(message.parts, vec![MessagePart::text("hello")]);
}

#[test]
fn legacy_content_array_shape() {
    let record = json!({
        "role": "assistant",
        "content": [
            {"type": "text", "text": "The forecast:"},
            {"type": "text", "text": "sunny"}
        ]
    });
    let message = normalize_stored_message(&record).unwrap();

    assert_eq!(
        message.parts,
        vec![MessagePart::text("The forecast:"), MessagePart::text("sunny")]
    );
}

#[test]
fn current_parts_shape_passes_through() {
    let record = json!({
        "id": "keep-me",
        "role": "assistant",
        "parts": [
            {"type": "text", "text": "It is 21.4°C."},
            {
                "type": "tool-get_weather",
                "toolCallId": "call-9",
                "state": "output-available",
                "input": {"latitude": 48.85, "longitude": 2.35},
                "output": {"current": {"temperature_2m": 21.4}}
            }
        ]
    });
    let message = normalize_stored_message(&record).unwrap();

    assert_eq!(message.id, "keep-me");
    assert_eq!(message.parts.len(), 2);
    let MessagePart::Tool(inv) = &message.parts[1] else {
        unreachable!("expected tool part");
    };
    assert_eq!(inv.tool_name, "get_weather");
    assert_eq!(inv.state, ToolState::OutputAvailable);
}

#[test]
fn missing_id_is_generated() {
    let record = json!({"role": "user", "content": "no id here"});
    let message = normalize_stored_message(&record).unwrap();
    assert!(!message.id.is_empty());
}

#[test]
fn normalization_is_total_over_arbitrary_records() {
    // None of these may panic or fail; each (except the tool role) must
    // yield a message with at least one part.
    let records = vec![
        json!({}),
        json!({"role": 17}),
        json!({"role": "assistant"}),
        json!({"role": "user", "content": null}),
        json!({"role": "user", "content": 42}),
        json!({"role": "user", "content": {"nested": "object"}}),
        json!({"role": "user", "parts": [{"type": "mystery"}, {"no": "type"}]}),
        json!({"role": "director", "content": "unknown role"}),
    ];

    for record in &records {
        let message = normalize_stored_message(record).unwrap();
        assert!(
            !message.parts.is_empty(),
            "record {record} produced no parts"
        );
    }
}

#[test]
fn tool_role_messages_are_filtered_out() {
    let records = vec![
        json!({"role": "user", "content": "question"}),
        json!({"role": "tool", "content": "internal result"}),
        json!({"role": "assistant", "content": "answer"}),
    ];

    let messages = convert_to_ui_messages(&records);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Assistant);
}

#[test]
fn unknown_part_shapes_degrade_to_empty_text() {
    let record = json!({"role": "user", "parts": [{"type": "hologram", "data": [1, 2, 3]}]});
    let message = normalize_stored_message(&record).unwrap();
    assert_eq!(message.parts, vec![MessagePart::text("")]);
}

#[test]
fn empty_chat_title_is_untitled() {
    let messages: Vec<UiMessage> = Vec::new();
    assert_eq!(derive_chat_title(&messages), UNTITLED);
}

#[test]
fn title_comes_from_first_text_part() {
    let records = vec![
        json!({"role": "user", "content": "How do I cook rice?"}),
        json!({"role": "assistant", "content": "Gladly!"}),
    ];
    let messages = convert_to_ui_messages(&records);
    assert_eq!(derive_chat_title(&messages), "How do I cook rice?");
}

#[test]
fn chat_with_only_tool_parts_is_untitled() {
    let records = vec![json!({
        "role": "assistant",
        "parts": [{
            "type": "tool-get_weather",
            "toolCallId": "c1",
            "state": "output-available",
            "output": {"current": {"temperature_2m": 3.0}}
        }]
    })];
    let messages = convert_to_ui_messages(&records);
    assert_eq!(derive_chat_title(&messages), UNTITLED);
}

#[test]
fn stored_transcript_shapes_all_parse() {
    // Plain array.
    let plain = json!([{"role": "user", "content": "a"}]).to_string();
    assert_eq!(parse_stored_transcript(&plain).len(), 1);

    // Double-encoded (oldest rows).
    let double = serde_json::to_string(&plain).unwrap();
    assert_eq!(parse_stored_transcript(&double).len(), 1);

    // Corrupt rows degrade to empty.
    assert!(parse_stored_transcript("{broken").is_empty());
    assert!(parse_stored_transcript("null").is_empty());
}

#[test]
fn normalized_messages_reserialize_in_parts_shape() {
    // Whatever shape came in, what goes back out is the parts shape.
    let record = json!({"role": "user", "content": "hello"});
    let message = normalize_stored_message(&record).unwrap();

    let out: Value = serde_json::to_value(&message).unwrap();
    assert_eq!(out["role"], "user");
    assert_eq!(out["parts"][0]["type"], "text");
    assert_eq!(out["parts"][0]["text"], "hello");
    assert!(out.get("content").is_none());
}
