// ABOUTME: Database operations for user accounts
// ABOUTME: Creates and looks up users for session authentication
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// One stored user row
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// User identifier (UUID string)
    pub id: String,
    /// Unique login email
    pub email: String,
    /// bcrypt password hash
    pub password_hash: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// User database operations manager
pub struct UserManager {
    pool: SqlitePool,
}

impl UserManager {
    /// Create a new user manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` when the email is already registered, or a
    /// database error for other failures.
    pub async fn create_user(&self, email: &str, password_hash: &str) -> AppResult<UserRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(&now)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                return Err(AppError::invalid_input("Email is already registered"));
            }
            return Err(AppError::database(format!("Failed to create user: {e}")));
        }

        Ok(UserRecord {
            id,
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: now,
        })
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        Ok(row.map(|r| UserRecord {
            id: r.get("id"),
            email: r.get("email"),
            password_hash: r.get("password_hash"),
            created_at: r.get("created_at"),
        }))
    }

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_user_by_id(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        Ok(row.map(|r| UserRecord {
            id: r.get("id"),
            email: r.get("email"),
            password_hash: r.get("password_hash"),
            created_at: r.get("created_at"),
        }))
    }
}
