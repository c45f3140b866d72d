// ABOUTME: History route returning the caller's normalized chat transcripts
// ABOUTME: Coerces legacy storage shapes and derives display titles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Chat history route.
//!
//! `GET /api/history` returns every chat belonging to the authenticated
//! user, newest first. Stored transcripts are normalized to the canonical
//! parts shape on the way out (legacy rows were written in older shapes,
//! including double-encoded JSON) and each chat gets a display title
//! derived from its first text part.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::errors::AppError;
use crate::messages::{
    convert_to_ui_messages, derive_chat_title, parse_stored_transcript, UiMessage,
};
use crate::server::ServerResources;

/// One chat in the history listing
#[derive(Debug, Serialize)]
pub struct HistoryItem {
    /// Chat identifier
    pub id: String,
    /// Creation timestamp (RFC 3339)
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Owning user
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Normalized transcript
    pub messages: Vec<UiMessage>,
    /// Display title derived from the first text part
    pub title: String,
}

/// History routes handler
pub struct HistoryRoutes;

impl HistoryRoutes {
    /// Create the history route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/history", get(Self::get_history))
            .with_state(resources)
    }

    /// List the caller's chats with normalized transcripts
    async fn get_history(
        State(resources): State<Arc<ServerResources>>,
        headers: axum::http::HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate_request(&headers)?;

        let chats = resources
            .database
            .chats()
            .list_chats_for_user(&auth.user_id.to_string())
            .await?;

        let items: Vec<HistoryItem> = chats
            .into_iter()
            .map(|chat| {
                let records = parse_stored_transcript(&chat.messages);
                let messages = convert_to_ui_messages(&records);
                let title = derive_chat_title(&messages);

                HistoryItem {
                    id: chat.id,
                    created_at: chat.created_at,
                    user_id: chat.user_id,
                    messages,
                    title,
                }
            })
            .collect();

        Ok(Json(items).into_response())
    }
}
