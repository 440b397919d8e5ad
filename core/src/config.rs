//! Client configuration.
//!
//! Loaded from TOML or from `MAMBU_*` environment variables:
//!
//! ```toml
//! base_url = "https://tenant.example.com/api"
//! api_key = "..."
//! timeout_secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("mambu-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Platform API root, e.g. `https://tenant.example.com/api`.
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::InvalidClientConfig(e.to_string()))?;
        config.validate()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidClientConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Read `MAMBU_BASE_URL` (required), `MAMBU_API_KEY`, `MAMBU_TIMEOUT_SECS`
    /// and `MAMBU_USER_AGENT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("MAMBU_BASE_URL")
            .ok_or_else(|| ConfigError::InvalidClientConfig("MAMBU_BASE_URL is not set".to_string()))?;
        let mut config = Self::new(base_url);
        config.api_key = lookup("MAMBU_API_KEY");
        if let Some(timeout) = lookup("MAMBU_TIMEOUT_SECS") {
            config.timeout_secs = timeout.trim().parse().map_err(|_| {
                ConfigError::InvalidClientConfig(format!("MAMBU_TIMEOUT_SECS is not a number: '{timeout}'"))
            })?;
        }
        if let Some(agent) = lookup("MAMBU_USER_AGENT") {
            config.user_agent = agent;
        }
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidClientConfig(format!("base_url '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidClientConfig(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidClientConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
