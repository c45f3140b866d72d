// ABOUTME: Externally-defined tools offered to the model during chat
// ABOUTME: Currently a single weather lookup backed by Open-Meteo
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Chat tools.
//!
//! The model can invoke externally-defined functions mid-generation. One
//! tool is offered: [`weather`]. Tool payloads are provider-defined JSON
//! rendered opaquely by the UI; the server never interprets them beyond
//! passing them through the tool lifecycle events.

pub mod weather;

pub use weather::WeatherClient;

use crate::llm::Tool;

/// All tool declarations offered with a chat generation
#[must_use]
pub fn chat_tools() -> Vec<Tool> {
    vec![Tool {
        function_declarations: vec![weather::declaration()],
    }]
}
