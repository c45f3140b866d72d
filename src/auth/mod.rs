// ABOUTME: Session authentication built on bcrypt credentials and signed tokens
// ABOUTME: Registers users, verifies logins, and authenticates inbound requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Authentication and session management.
//!
//! Passwords are stored as bcrypt hashes; sessions are HS256-signed tokens
//! carrying the user id and email. Requests present the token either in an
//! `Authorization: Bearer` header or in the `session_token` cookie.

pub mod cookies;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::task;
use uuid::Uuid;

use crate::database::{Database, UserRecord};
use crate::errors::{AppError, AppResult};

/// Minimum accepted password length
const MIN_PASSWORD_LEN: usize = 8;

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// User id
    sub: String,
    /// User email
    email: String,
    /// Issued-at (seconds since epoch)
    iat: i64,
    /// Expiry (seconds since epoch)
    exp: i64,
}

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User identifier
    pub user_id: Uuid,
    /// User email
    pub email: String,
}

/// Authentication manager
pub struct AuthManager {
    database: Database,
    secret: Vec<u8>,
    session_ttl_secs: i64,
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub fn new(database: Database, secret: &str, session_ttl_secs: i64) -> Self {
        Self {
            database,
            secret: secret.as_bytes().to_vec(),
            session_ttl_secs,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` for malformed credentials or an already
    /// registered email.
    pub async fn register(&self, email: &str, password: &str) -> AppResult<UserRecord> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AppError::invalid_input("Invalid email address"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password = password.to_owned();
        let password_hash = task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

        self.database.users().create_user(&email, &password_hash).await
    }

    /// Verify credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns `auth_invalid` for unknown emails or wrong passwords.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(UserRecord, String)> {
        let email = email.trim().to_lowercase();
        let user = self
            .database
            .users()
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        let password = password.to_owned();
        let stored_hash = user.password_hash.clone();
        let is_valid = task::spawn_blocking(move || bcrypt::verify(&password, &stored_hash))
            .await
            .map_err(|e| AppError::internal(format!("Verification task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))?;

        if !is_valid {
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        let token = self.issue_session_token(&user)?;
        Ok((user, token))
    }

    /// Issue a session token for a user.
    ///
    /// # Errors
    ///
    /// Returns an internal error when signing fails.
    pub fn issue_session_token(&self, user: &UserRecord) -> AppResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now + self.session_ttl_secs,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// Authenticate a request from its headers.
    ///
    /// The token is taken from the `Authorization: Bearer` header first,
    /// then from the `session_token` cookie.
    ///
    /// # Errors
    ///
    /// Returns `auth_required` when no token is present and `auth_invalid`
    /// when the token fails validation.
    pub fn authenticate_request(&self, headers: &HeaderMap) -> AppResult<AuthenticatedUser> {
        let token = bearer_token(headers)
            .or_else(|| cookies::get_cookie_value(headers, cookies::SESSION_COOKIE))
            .ok_or_else(|| AppError::auth_required("Missing session"))?;

        self.validate_session_token(&token)
    }

    /// Validate a raw session token.
    ///
    /// # Errors
    ///
    /// Returns `auth_invalid` for expired or malformed tokens.
    pub fn validate_session_token(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AppError::auth_invalid(format!("Invalid session: {e}")))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::auth_invalid("Invalid session subject"))?;

        Ok(AuthenticatedUser {
            user_id,
            email: data.claims.email,
        })
    }
}

/// Extract a bearer token from the `Authorization` header
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
}
