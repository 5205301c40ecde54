#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API response types for the farm map server.
//!
//! Chart views, filters, and interaction outcomes are served as the
//! dashboard crates define them; the types here cover the server's own
//! endpoints.

use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Deployment environment name.
    pub environment: String,
    /// Base URL of the survey API for this environment.
    pub api_base_url: String,
    /// Delay before deferred chart redraws, in milliseconds.
    pub defer_ms: u64,
    /// Farm-size breakpoints in square metres, largest first.
    pub breakpoints: Vec<u64>,
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_serializes_camel_case() {
        let config = ApiConfig {
            environment: "production".to_string(),
            api_base_url: "https://api.app.litefarm.org".to_string(),
            defer_ms: 500,
            breakpoints: vec![100_000, 10_000, 0],
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["apiBaseUrl"], "https://api.app.litefarm.org");
        assert_eq!(json["deferMs"], 500);
    }
}
