// ABOUTME: Weather lookup tool backed by the Open-Meteo forecast API
// ABOUTME: Fetches current temperature plus hourly and sunrise/sunset data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cirrus Chat Contributors

//! Weather tool.
//!
//! `get_weather(latitude, longitude)` fetches the Open-Meteo forecast for a
//! coordinate pair. The API is free and unauthenticated; the response JSON
//! is returned opaquely for the UI's weather widget. The base URL is
//! configurable so tests can point the client at a local stub.

use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::llm::FunctionDeclaration;

/// Tool name as declared to the model
pub const TOOL_NAME: &str = "get_weather";

/// Declaration for the weather function
#[must_use]
pub fn declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: TOOL_NAME.to_owned(),
        description: "Get the current weather at a location".to_owned(),
        parameters: Some(json!({
            "type": "object",
            "properties": {
                "latitude": {"type": "number", "description": "Latitude coordinate"},
                "longitude": {"type": "number", "description": "Longitude coordinate"}
            },
            "required": ["latitude", "longitude"]
        })),
    }
}

/// Open-Meteo client
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    /// Create a client against the given Open-Meteo endpoint
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Execute a tool invocation from model-provided arguments.
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` when the coordinates are missing or not
    /// numeric, and `external_service` when the lookup fails.
    pub async fn execute(&self, args: &Value) -> AppResult<Value> {
        let latitude = args
            .get("latitude")
            .and_then(Value::as_f64)
            .ok_or_else(|| AppError::invalid_input("get_weather requires a numeric latitude"))?;
        let longitude = args
            .get("longitude")
            .and_then(Value::as_f64)
            .ok_or_else(|| AppError::invalid_input("get_weather requires a numeric longitude"))?;

        self.get_weather(latitude, longitude).await
    }

    /// Fetch the forecast for a coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns `external_service` when the request fails or the response is
    /// not JSON.
    pub async fn get_weather(&self, latitude: f64, longitude: f64) -> AppResult<Value> {
        let url = format!(
            "{}/v1/forecast?latitude={latitude}&longitude={longitude}\
             &current=temperature_2m&hourly=temperature_2m&daily=sunrise,sunset&timezone=auto",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::external_service(format!("Weather request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "Weather provider returned {status}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::external_service(format!("Invalid weather response: {e}")))
    }
}
