//! Connection Configuration
//!
//! Named API connections (base URL, version, transport options) and the
//! registry a [`Builder`](crate::Builder) resolves them from. Registries are
//! plain values handed to the builder; they can be assembled in code or
//! loaded from a YAML/JSON file.

use crate::error::{RestError, RestResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable overriding the default registry location
pub const CONFIG_ENV: &str = "RESTMODEL_CONFIG";

/// Name used for the default connection when none is given
pub const DEFAULT_CONNECTION: &str = "default";

/// Basic authentication credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Options forwarded to the HTTP transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Total request timeout in seconds
    #[serde(default)]
    pub timeout: Option<f64>,
    /// Connect timeout in seconds
    #[serde(default)]
    pub connect_timeout: Option<f64>,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
}

impl TransportOptions {
    pub fn timeout(&self) -> RestResult<Option<Duration>> {
        seconds("timeout", self.timeout)
    }

    pub fn connect_timeout(&self) -> RestResult<Option<Duration>> {
        seconds("connect_timeout", self.connect_timeout)
    }

    /// Reject negative, NaN or out-of-range timeouts
    pub fn validate(&self) -> RestResult<()> {
        self.timeout()?;
        self.connect_timeout()?;
        Ok(())
    }
}

fn seconds(name: &str, value: Option<f64>) -> RestResult<Option<Duration>> {
    value
        .map(|secs| {
            Duration::try_from_secs_f64(secs).map_err(|e| {
                RestError::Configuration(format!("invalid {} `{}`: {}", name, secs, e))
            })
        })
        .transpose()
}

/// A single API connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL every endpoint starts with
    pub url: String,
    /// API version segment placed right after the base URL
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub options: TransportOptions,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: None,
            options: TransportOptions::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.options.bearer_token = Some(token.into());
        self
    }

    /// Check that the base URL is absolute and parseable and the timeouts usable
    pub fn validate(&self) -> RestResult<()> {
        Url::parse(&self.url)
            .map_err(|e| RestError::Configuration(format!("invalid url `{}`: {}", self.url, e)))?;
        self.options.validate()
    }
}

/// Registry of named connections plus the default connection name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRegistry {
    #[serde(default = "default_connection_name")]
    pub default: String,
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

fn default_connection_name() -> String {
    DEFAULT_CONNECTION.to_string()
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION)
    }
}

impl ConnectionRegistry {
    /// Create an empty registry whose default connection is `default`
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            connections: BTreeMap::new(),
        }
    }

    /// Register (or replace) a connection
    pub fn with_connection(mut self, name: impl Into<String>, config: ConnectionConfig) -> Self {
        self.connections.insert(name.into(), config);
        self
    }

    /// Name of the connection used by models that declare none
    pub fn default_connection(&self) -> &str {
        &self.default
    }

    /// Resolve a connection by name
    pub fn resolve(&self, name: &str) -> RestResult<&ConnectionConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| RestError::UnknownConnection(name.to_string()))
    }

    /// Check every URL and that the default connection is registered
    pub fn validate(&self) -> RestResult<()> {
        for config in self.connections.values() {
            config.validate()?;
        }

        if !self.connections.contains_key(&self.default) {
            return Err(RestError::Configuration(format!(
                "default connection `{}` is not registered",
                self.default
            )));
        }

        Ok(())
    }

    /// Parse a registry from YAML
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let registry: Self =
            serde_yaml::from_str(content).context("Failed to parse connection registry YAML")?;
        registry.validate()?;
        Ok(registry)
    }

    /// Parse a registry from JSON
    pub fn from_json_str(content: &str) -> Result<Self> {
        let registry: Self =
            serde_json::from_str(content).context("Failed to parse connection registry JSON")?;
        registry.validate()?;
        Ok(registry)
    }

    /// Load a registry from disk (`.json` files as JSON, anything else as YAML)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read connection registry {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Load the registry from `$RESTMODEL_CONFIG` or the user config dir
    pub fn load_default() -> Result<Self> {
        let path = Self::config_path().context("No configuration directory available")?;
        tracing::debug!("Loading connection registry from {:?}", path);
        Self::load(&path)
    }

    /// Get the default registry file path
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("restmodel").join("connections.yaml"))
    }
}
