// ABOUTME: Route module organization for the Cirrus Chat HTTP endpoints
// ABOUTME: Groups handlers by domain with thin handlers over the service layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! HTTP routes.
//!
//! Each domain module exposes a `routes(resources)` constructor returning
//! an [`axum::Router`]; [`crate::server`] merges them and applies the
//! shared middleware stack.

/// Health check route
pub mod health;

/// Session registration, login, and logout
pub mod auth;

/// Chat streaming and deletion
pub mod chat;

/// Transcript history listing
pub mod history;
