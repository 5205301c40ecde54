//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! | --- | --- |
//! | `BIND_ADDR` | `127.0.0.1` |
//! | `PORT` | `8080` |
//! | `FARM_MAP_DATA_DIR` | `<workspace>/data` |
//! | `FARM_MAP_ENV` | `development` |
//! | `FARM_MAP_API_URL` | per environment |
//! | `FARM_MAP_DEFER_MS` | `500` |

use std::path::PathBuf;
use std::time::Duration;

use farm_map_dashboard::orchestrator::DEFAULT_DEFER_DELAY;
use farm_map_dashboard::{DashboardConfig, OrchestratorConfig};
use farm_map_server_models::ApiConfig;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Deployment environment.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    /// Local development against a local API.
    #[default]
    Development,
    /// The production deployment.
    Production,
    /// The beta/integration deployment.
    Integration,
}

impl Environment {
    /// Survey API base URL used when `FARM_MAP_API_URL` is not set.
    #[must_use]
    pub const fn default_api_base_url(self) -> &'static str {
        match self {
            Self::Development => "http://localhost:5000",
            Self::Production => "https://api.app.litefarm.org",
            Self::Integration => "https://api.beta.litefarm.org",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Development, Self::Production, Self::Integration]
    }
}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Directory holding the survey input files.
    pub data_dir: PathBuf,
    /// Deployment environment.
    pub environment: Environment,
    /// Survey API base URL.
    pub api_base_url: String,
    /// Delay before deferred chart redraws.
    pub defer_delay: Duration,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Missing or unparsable
    /// values fall back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = lookup("FARM_MAP_DATA_DIR")
            .filter(|dir| !dir.is_empty())
            .map_or_else(farm_map_dataset::paths::data_dir, PathBuf::from);

        let environment = match lookup("FARM_MAP_ENV") {
            Some(value) => value.parse().unwrap_or_else(|_| {
                log::warn!("Unknown FARM_MAP_ENV '{value}', using development");
                Environment::Development
            }),
            None => Environment::default(),
        };

        let api_base_url = lookup("FARM_MAP_API_URL")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| environment.default_api_base_url().to_string());

        let defer_delay = lookup("FARM_MAP_DEFER_MS")
            .and_then(|ms| ms.parse().ok())
            .map_or(DEFAULT_DEFER_DELAY, Duration::from_millis);

        Self {
            bind_addr,
            port,
            data_dir,
            environment,
            api_base_url,
            defer_delay,
        }
    }

    /// Dashboard settings derived from this configuration.
    #[must_use]
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            orchestrator: OrchestratorConfig {
                defer_delay: self.defer_delay,
                ..OrchestratorConfig::default()
            },
            ..DashboardConfig::default()
        }
    }

    /// The API view of this configuration.
    #[must_use]
    pub fn to_api(&self, dashboard: &DashboardConfig) -> ApiConfig {
        ApiConfig {
            environment: self.environment.to_string(),
            api_base_url: self.api_base_url.clone(),
            defer_ms: u64::try_from(self.defer_delay.as_millis()).unwrap_or(u64::MAX),
            breakpoints: dashboard.breakpoints.clone().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup_config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = lookup_config(&[]);
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.defer_delay, DEFAULT_DEFER_DELAY);
        assert!(config.data_dir.ends_with("data"));
    }

    #[test]
    fn environment_selects_api_url() {
        let config = lookup_config(&[("FARM_MAP_ENV", "Production")]);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api_base_url, "https://api.app.litefarm.org");

        let config = lookup_config(&[("FARM_MAP_ENV", "integration")]);
        assert_eq!(config.api_base_url, "https://api.beta.litefarm.org");
    }

    #[test]
    fn explicit_api_url_wins() {
        let config = lookup_config(&[
            ("FARM_MAP_ENV", "production"),
            ("FARM_MAP_API_URL", "https://example.test"),
        ]);
        assert_eq!(config.api_base_url, "https://example.test");
    }

    #[test]
    fn bad_values_fall_back() {
        let config = lookup_config(&[
            ("FARM_MAP_ENV", "staging"),
            ("PORT", "http"),
            ("FARM_MAP_DEFER_MS", "soon"),
        ]);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, 8080);
        assert_eq!(config.defer_delay, DEFAULT_DEFER_DELAY);
    }

    #[test]
    fn overrides_apply() {
        let config = lookup_config(&[
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "5050"),
            ("FARM_MAP_DATA_DIR", "/srv/farm"),
            ("FARM_MAP_DEFER_MS", "0"),
        ]);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 5050);
        assert_eq!(config.data_dir, PathBuf::from("/srv/farm"));
        assert_eq!(config.defer_delay, Duration::ZERO);

        let dashboard = config.dashboard_config();
        assert_eq!(dashboard.orchestrator.defer_delay, Duration::ZERO);
        let api = config.to_api(&dashboard);
        assert_eq!(api.breakpoints, vec![100_000, 10_000, 0]);
        assert_eq!(api.defer_ms, 0);
    }

    #[test]
    fn environment_names() {
        let names: Vec<String> = Environment::all().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["development", "production", "integration"]);
    }
}
