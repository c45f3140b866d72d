// ABOUTME: Structured logging initialization built on tracing-subscriber
// ABOUTME: Supports pretty output for development and JSON lines for production
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Logging setup.
//!
//! The filter is taken from `RUST_LOG` when set, otherwise defaults to
//! `info` for this crate and `warn` for dependencies. Setting
//! `CIRRUS_LOG_FORMAT=json` switches the output to JSON lines for log
//! aggregation.

use std::env;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "warn,cirrus_chat=info,cirrus_chat_server=info";

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once (tests initialize repeatedly); only the
/// first call installs the global default.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = env::var("CIRRUS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    // An already-installed subscriber is not an error worth surfacing.
    drop(result);
}
