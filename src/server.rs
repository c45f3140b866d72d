// ABOUTME: Server assembly wiring resources, routes, and middleware together
// ABOUTME: Builds the axum router and serves it with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Server assembly.
//!
//! [`ServerResources`] is the shared per-process state handed to every
//! route: database handle, authentication manager, model gateway, and the
//! weather client. [`router`] merges the route modules and applies request
//! tracing plus (when configured) CORS; [`serve`] binds the listener and
//! runs until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::ModelGateway;
use crate::routes::auth::AuthRoutes;
use crate::routes::chat::ChatRoutes;
use crate::routes::health::HealthRoutes;
use crate::routes::history::HistoryRoutes;
use crate::tools::WeatherClient;

/// Shared state for all request handlers
pub struct ServerResources {
    /// Server configuration
    pub config: ServerConfig,
    /// Database handle
    pub database: Database,
    /// Session authentication
    pub auth: AuthManager,
    /// Model gateway
    pub gateway: ModelGateway,
    /// Weather tool client
    pub weather: WeatherClient,
}

impl ServerResources {
    /// Wire resources from configuration and an open database
    #[must_use]
    pub fn new(config: ServerConfig, database: Database) -> Self {
        let auth = AuthManager::new(
            database.clone(),
            &config.session_secret,
            config.session_ttl_secs,
        );
        let gateway = ModelGateway::new(&config.llm);
        let weather = WeatherClient::new(&config.weather_base_url);

        Self {
            config,
            database,
            auth,
            gateway,
            weather,
        }
    }
}

/// Build the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    let mut app = Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(ChatRoutes::routes(resources.clone()))
        .merge(HistoryRoutes::routes(resources.clone()))
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = resources.config.cors_allowed_origin.as_deref() {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                // Credentials are required for the session cookie, which in
                // turn requires explicit (non-wildcard) headers.
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_methods([Method::GET, Method::POST, Method::DELETE])
                        .allow_headers([
                            axum::http::header::CONTENT_TYPE,
                            axum::http::header::AUTHORIZATION,
                        ])
                        .allow_credentials(true),
                );
            }
            Err(_) => warn!("CIRRUS_CORS_ORIGIN is not a valid header value; CORS disabled"),
        }
    }

    app
}

/// Bind and serve until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error when the listener cannot bind or the server fails.
pub async fn serve(resources: Arc<ServerResources>) -> AppResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], resources.config.http_port));
    let app = router(resources);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("server stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl-C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
