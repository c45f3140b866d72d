// ABOUTME: Main library entry point for the Cirrus Chat server
// ABOUTME: Streams model responses over SSE and persists transcripts per user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! # Cirrus Chat Server
//!
//! A conversational web service: authenticated clients POST a message list
//! to the chat endpoint, the server streams a hosted-model response as
//! UI-message events (optionally invoking a weather lookup tool
//! mid-stream), and the completed transcript is persisted per user. A
//! history endpoint returns stored transcripts normalized to one canonical
//! message-part shape with derived display titles.
//!
//! ## Architecture
//!
//! - **`llm`**: model gateway wrapping the hosted client behind
//!   response-shaping middleware and word-level stream smoothing
//! - **`messages`**: canonical message model plus legacy-shape
//!   normalization and title derivation
//! - **`routes`**: HTTP handlers for chat streaming, history, sessions,
//!   and health
//! - **`database`**: SQLite-backed users and transcripts
//! - **`auth`**: bcrypt credentials with signed session tokens
//!
//! ## Example
//!
//! ```rust,no_run
//! use cirrus_chat::config::ServerConfig;
//! use cirrus_chat::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Cirrus Chat configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Session authentication and cookie helpers
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// SQLite storage for users and chat transcripts
pub mod database;

/// Unified error handling with HTTP response mapping
pub mod errors;

/// LLM provider abstraction and streaming gateway
pub mod llm;

/// Structured logging initialization
pub mod logging;

/// Canonical message model and legacy-shape normalization
pub mod messages;

/// HTTP route handlers
pub mod routes;

/// Router assembly and serving
pub mod server;

/// Externally-defined chat tools
pub mod tools;
