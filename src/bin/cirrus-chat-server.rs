// ABOUTME: Binary entry point for the Cirrus Chat HTTP server
// ABOUTME: Loads configuration, opens the database, and serves until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! cirrus-chat-server — entry point.
//!
//! Startup order: parse CLI flags, initialize tracing, load configuration
//! from the environment, open the database and run migrations, then serve
//! the HTTP API with graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use cirrus_chat::config::ServerConfig;
use cirrus_chat::database::Database;
use cirrus_chat::logging;
use cirrus_chat::server::{self, ServerResources};

/// Cirrus Chat server
#[derive(Debug, Parser)]
#[command(name = "cirrus-chat-server", version, about)]
struct Args {
    /// Override the HTTP port (defaults to CIRRUS_HTTP_PORT or 8080)
    #[arg(long)]
    port: Option<u16>,

    /// Override the database URL (defaults to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init();

    let mut config = ServerConfig::from_env().context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.http_port,
        model = %config.llm.model,
        "cirrus-chat-server starting"
    );

    let database = Database::new(&config.database_url)
        .await
        .context("failed to open database")?;
    info!(database_url = %config.database_url, "database ready");

    let resources = Arc::new(ServerResources::new(config, database));
    server::serve(resources).await.context("server failed")?;

    Ok(())
}
