// ABOUTME: Unified error handling for the Cirrus Chat server
// ABOUTME: Maps application error kinds to HTTP responses with JSON bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Unified error type for all request handling.
//!
//! Handlers return [`AppResult`]; the [`axum::response::IntoResponse`]
//! implementation converts each error kind to an HTTP status and a JSON body.
//! Internal error detail (SQL, upstream bodies) is logged, never returned to
//! the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Convenience alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

/// All error kinds that can occur in the request lifecycle
#[derive(Debug, Error)]
pub enum AppError {
    /// No session was presented with the request
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// A session was presented but is invalid, expired, or does not grant
    /// access to the resource (non-owner access reports this kind)
    #[error("authentication invalid: {0}")]
    AuthInvalid(String),

    /// The referenced resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or parameters are malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A database operation failed
    #[error("database error: {0}")]
    Database(String),

    /// Server configuration is missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// An upstream service (model provider, weather API) failed
    #[error("external service error: {0}")]
    ExternalService(String),

    /// An unclassified internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Missing session (401)
    pub fn auth_required(msg: impl Into<String>) -> Self {
        Self::AuthRequired(msg.into())
    }

    /// Invalid session or non-owner access (401)
    pub fn auth_invalid(msg: impl Into<String>) -> Self {
        Self::AuthInvalid(msg.into())
    }

    /// Missing resource (404)
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Malformed request (400)
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Database failure (500)
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Configuration failure (500)
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Upstream service failure (500)
    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    /// Unclassified internal failure (500)
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The HTTP status this error maps to
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthRequired(_) | Self::AuthInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Config(_) | Self::ExternalService(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Client-facing message: auth, not-found, and validation kinds are
        // safe to expose; internal kinds are logged in full and replaced
        // with a generic body.
        let client_message = match &self {
            Self::AuthRequired(m) | Self::AuthInvalid(m) => m.clone(),
            Self::NotFound(m) => m.clone(),
            Self::InvalidInput(m) => m.clone(),
            Self::Database(m) | Self::Config(m) | Self::ExternalService(m) | Self::Internal(m) => {
                error!(error = %m, status = %status, "internal server error");
                "An error occurred while processing your request".to_owned()
            }
        };

        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
