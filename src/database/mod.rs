// ABOUTME: SQLite-backed storage layer for users and chat transcripts
// ABOUTME: Owns the connection pool and runs idempotent startup migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Database access.
//!
//! One [`Database`] wraps the SQLite pool and hands out per-domain managers
//! ([`ChatManager`], [`UserManager`]). Migrations are plain idempotent
//! `CREATE TABLE IF NOT EXISTS` statements executed at startup.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};

pub mod chat;
pub mod users;

pub use chat::{ChatManager, ChatRecord};
pub use users::{UserManager, UserRecord};

/// Shared database handle
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection or a migration statement fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let database = Self { pool };
        database.migrate().await?;
        Ok(database)
    }

    /// Wrap an existing pool (tests construct in-memory pools directly)
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run idempotent schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when a statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create users table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                messages TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create chats table: {e}")))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_chats_user_created
            ON chats (user_id, created_at DESC)
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create chats index: {e}")))?;

        Ok(())
    }

    /// Direct pool access (migrations, tests)
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Chat transcript operations
    #[must_use]
    pub fn chats(&self) -> ChatManager {
        ChatManager::new(self.pool.clone())
    }

    /// User account operations
    #[must_use]
    pub fn users(&self) -> UserManager {
        UserManager::new(self.pool.clone())
    }
}
