// ABOUTME: Environment-driven server configuration
// ABOUTME: Collects HTTP, database, session, model-provider and tool settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Server configuration.
//!
//! Configuration is environment-only: every setting is read from an
//! environment variable with a sensible default, except the model provider
//! API key and the session secret, which have no safe default and must be
//! set. Tests construct [`ServerConfig`] directly instead of going through
//! the environment.

use std::env;

use crate::errors::{AppError, AppResult};

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default SQLite database URL (file in the working directory)
const DEFAULT_DATABASE_URL: &str = "sqlite:cirrus_chat.db?mode=rwc";

/// Default session lifetime (7 days)
const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Default Gemini API endpoint
const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model served by the chat endpoint
const DEFAULT_LLM_MODEL: &str = "gemini-1.5-flash";

/// Default Open-Meteo endpoint for the weather tool
const DEFAULT_WEATHER_BASE_URL: &str = "https://api.open-meteo.com";

/// Default smooth-stream delay between word chunks, in milliseconds
const DEFAULT_STREAM_DELAY_MS: u64 = 8;

/// Model provider settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key for the hosted model provider
    pub api_key: String,
    /// Model identifier sent with every generation request
    pub model: String,
    /// Base URL of the provider API (overridable for tests)
    pub base_url: String,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP server binds to
    pub http_port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Secret used to sign session tokens
    pub session_secret: String,
    /// Session token lifetime in seconds
    pub session_ttl_secs: i64,
    /// Model provider settings
    pub llm: LlmConfig,
    /// Base URL of the weather tool API (overridable for tests)
    pub weather_base_url: String,
    /// Delay between word chunks when smoothing streamed text
    pub stream_delay_ms: u64,
    /// Allowed CORS origin for the browser UI, if any
    pub cors_allowed_origin: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `CIRRUS_SESSION_SECRET` or
    /// `GEMINI_API_KEY` is missing, or when a numeric variable fails to
    /// parse.
    pub fn from_env() -> AppResult<Self> {
        let http_port = parse_env("CIRRUS_HTTP_PORT", DEFAULT_HTTP_PORT)?;
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());

        let session_secret = env::var("CIRRUS_SESSION_SECRET")
            .map_err(|_| AppError::config("CIRRUS_SESSION_SECRET environment variable not set"))?;
        let session_ttl_secs = parse_env("CIRRUS_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;

        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| AppError::config("GEMINI_API_KEY environment variable not set"))?;
        let model = env::var("CIRRUS_LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_owned());
        let base_url =
            env::var("CIRRUS_LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_owned());

        let weather_base_url = env::var("CIRRUS_WEATHER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_WEATHER_BASE_URL.to_owned());

        let stream_delay_ms = parse_env("CIRRUS_STREAM_DELAY_MS", DEFAULT_STREAM_DELAY_MS)?;
        let cors_allowed_origin = env::var("CIRRUS_CORS_ORIGIN").ok();

        Ok(Self {
            http_port,
            database_url,
            session_secret,
            session_ttl_secs,
            llm: LlmConfig {
                api_key,
                model,
                base_url,
            },
            weather_base_url,
            stream_delay_ms,
            cors_allowed_origin,
        })
    }
}

/// Read an environment variable and parse it, falling back to `default`
/// when the variable is unset.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}
