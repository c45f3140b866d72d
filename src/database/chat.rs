// ABOUTME: Database operations for chat transcripts
// ABOUTME: Upserts whole transcripts keyed by chat id and lists them per user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Chat transcript storage.
//!
//! A chat row holds the full transcript as a JSON text column. Saves are
//! whole-transcript upserts: the first save creates the row, later saves
//! replace the `messages` column and leave `user_id` and `created_at`
//! untouched. Rows are deleted wholesale; past parts are never mutated in
//! place.

use sqlx::{Row, SqlitePool};

use crate::errors::{AppError, AppResult};

/// One stored chat row. `messages` is the raw JSON column text; callers
/// normalize it with [`crate::messages::parse_stored_transcript`].
#[derive(Debug, Clone)]
pub struct ChatRecord {
    /// Chat identifier (UUID string)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// Raw transcript JSON
    pub messages: String,
}

/// Chat database operations manager
pub struct ChatManager {
    pool: SqlitePool,
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save a transcript, creating the chat on first write and replacing
    /// the stored messages on subsequent writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn save_chat(
        &self,
        chat_id: &str,
        user_id: &str,
        messages_json: &str,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO chats (id, user_id, created_at, messages)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(id) DO UPDATE SET messages = excluded.messages
            ",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(&now)
        .bind(messages_json)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save chat: {e}")))?;

        Ok(())
    }

    /// Get a chat by id (no owner filter; callers check ownership).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_chat(&self, chat_id: &str) -> AppResult<Option<ChatRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, created_at, messages
            FROM chats
            WHERE id = $1
            ",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get chat: {e}")))?;

        Ok(row.map(|r| ChatRecord {
            id: r.get("id"),
            user_id: r.get("user_id"),
            created_at: r.get("created_at"),
            messages: r.get("messages"),
        }))
    }

    /// List all chats for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_chats_for_user(&self, user_id: &str) -> AppResult<Vec<ChatRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, created_at, messages
            FROM chats
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list chats: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|r| ChatRecord {
                id: r.get("id"),
                user_id: r.get("user_id"),
                created_at: r.get("created_at"),
                messages: r.get("messages"),
            })
            .collect())
    }

    /// Delete a chat wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete_chat(&self, chat_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM chats
            WHERE id = $1
            ",
        )
        .bind(chat_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete chat: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
