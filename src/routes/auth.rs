// ABOUTME: Session routes for registration, login, and logout
// ABOUTME: Issues the httpOnly session cookie consumed by the chat UI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Authentication routes.
//!
//! Registration creates the account; login verifies credentials and sets
//! the `session_token` cookie (the token is also returned in the body for
//! non-browser clients); logout clears the cookie.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::cookies;
use crate::errors::AppError;
use crate::server::ServerResources;

/// Credentials for registration and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    /// Login email
    pub email: String,
    /// Plain-text password (hashed before storage)
    pub password: String,
}

/// Public view of a user account
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User identifier
    pub id: String,
    /// Login email
    pub email: String,
}

/// Login response body
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The authenticated user
    pub user: UserResponse,
    /// Session token (also set as a cookie)
    pub token: String,
}

/// Authentication routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/logout", post(Self::logout))
            .with_state(resources)
    }

    /// Register a new account
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<CredentialsRequest>,
    ) -> Result<Response, AppError> {
        let user = resources
            .auth
            .register(&request.email, &request.password)
            .await?;

        info!(user_id = %user.id, "user registered");

        let body = UserResponse {
            id: user.id,
            email: user.email,
        };
        Ok((StatusCode::CREATED, Json(body)).into_response())
    }

    /// Verify credentials and start a session
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<CredentialsRequest>,
    ) -> Result<Response, AppError> {
        let (user, token) = resources
            .auth
            .login(&request.email, &request.password)
            .await?;

        let mut headers = HeaderMap::new();
        cookies::set_session_cookie(&mut headers, &token, resources.config.session_ttl_secs);

        let body = LoginResponse {
            user: UserResponse {
                id: user.id,
                email: user.email,
            },
            token,
        };
        Ok((StatusCode::OK, headers, Json(body)).into_response())
    }

    /// End the session by clearing the cookie
    async fn logout() -> Response {
        let mut headers = HeaderMap::new();
        cookies::clear_session_cookie(&mut headers);
        (StatusCode::OK, headers).into_response()
    }
}
