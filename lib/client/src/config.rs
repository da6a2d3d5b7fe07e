//! Client configuration.
//!
//! Native consumers load [`ClientConfig`] from `FLOWFORGE_*` environment
//! variables via the `config` crate. The browser build has no process
//! environment, so [`ClientConfig::compiled`] reads the same settings at
//! compile time instead.

use serde::Deserialize;

/// Where the API lives and where to send unauthenticated users.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API, including the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Origin of the real-time endpoint (`ws://` or `wss://`).
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,

    /// Route the 401 handler redirects to.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

fn default_api_base_url() -> String {
    "http://localhost:3001/api".to_string()
}

fn default_ws_base_url() -> String {
    "ws://localhost:3001".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            ws_base_url: default_ws_base_url(),
            login_path: default_login_path(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from `FLOWFORGE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::with_prefix("FLOWFORGE"))
    }

    /// Loads configuration from the given environment source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_environment(env: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Configuration baked in at compile time from `FLOWFORGE_API_URL` and
    /// `FLOWFORGE_WS_URL`.
    #[must_use]
    pub fn compiled() -> Self {
        let mut config = Self::default();
        if let Some(url) = option_env!("FLOWFORGE_API_URL") {
            config.api_base_url = url.to_string();
        }
        if let Some(url) = option_env!("FLOWFORGE_WS_URL") {
            config.ws_base_url = url.to_string();
        }
        config
    }

    /// Absolute URL of an API path such as `/workflows`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL of the real-time channel for `user_id`.
    #[must_use]
    pub fn realtime_url(&self, user_id: &str) -> String {
        format!(
            "{}/api/ws?userId={user_id}",
            self.ws_base_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        config::Environment::with_prefix("FLOWFORGE").source(Some(map))
    }

    #[test]
    fn defaults_match_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:3001/api");
        assert_eq!(config.login_path, "/login");
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ClientConfig::from_environment(env(&[])).expect("config");
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn environment_overrides() {
        let config = ClientConfig::from_environment(env(&[
            ("FLOWFORGE_API_BASE_URL", "https://flows.example.com/api"),
            ("FLOWFORGE_LOGIN_PATH", "/signin"),
        ]))
        .expect("config");
        assert_eq!(config.api_base_url, "https://flows.example.com/api");
        assert_eq!(config.login_path, "/signin");
        assert_eq!(config.ws_base_url, "ws://localhost:3001");
    }

    #[test]
    fn endpoint_joins_single_slash() {
        let config = ClientConfig {
            api_base_url: "http://host/api/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.endpoint("/runs/1"), "http://host/api/runs/1");
        assert_eq!(config.endpoint("metrics"), "http://host/api/metrics");
    }

    #[test]
    fn realtime_url_carries_user() {
        let config = ClientConfig::default();
        assert_eq!(
            config.realtime_url("u-1"),
            "ws://localhost:3001/api/ws?userId=u-1"
        );
    }
}
