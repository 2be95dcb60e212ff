use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LoggingConfig;

/// Top-level configuration, read from `config.toml`.
///
/// Every section is optional in the file; missing keys fall back to the
/// values a local Consul agent listens on.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BeaconConfig {
    pub consul: ConsulConfig,
    pub notify: NotifyConfig,
    pub mongo: MongoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConsulConfig {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub token: Option<String>,
    pub datacenter: Option<String>,
    pub timeout_seconds: u64,
    /// Only list instances whose checks are all passing.
    pub only_passing: bool,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8500,
            scheme: "http".to_string(),
            token: None,
            datacenter: None,
            timeout_seconds: 10,
            only_passing: false,
        }
    }
}

impl ConsulConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_seconds: 10,
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
        }
    }
}

impl BeaconConfig {
    /// Default config location: `<config dir>/beacon/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("beacon")
            .join("config.toml")
    }

    /// File `load` reads: the explicit path, else the default location.
    pub fn source_path(path: Option<&Path>) -> PathBuf {
        path.map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one the default location is
    /// tried, and a missing file there yields the defaults. Runs before the
    /// subscriber is installed, so callers log the source themselves.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let required = path.is_some();
        let path = Self::source_path(path);

        if !path.exists() {
            if required {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config at {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BeaconConfig =
            toml::from_str(content).with_context(|| "Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config at {:?}", path.as_ref()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let consul = &self.consul;

        if consul.host.trim().is_empty() {
            return Err(invalid("consul.host cannot be empty"));
        }
        if consul.port == 0 {
            return Err(invalid("consul.port must be between 1 and 65535"));
        }
        if consul.scheme != "http" && consul.scheme != "https" {
            return Err(invalid(&format!(
                "consul.scheme must be http or https, got '{}'",
                consul.scheme
            )));
        }
        if consul.timeout_seconds == 0 {
            return Err(invalid("consul.timeout_seconds must be positive"));
        }

        if self.notify.timeout_seconds == 0 {
            return Err(invalid("notify.timeout_seconds must be positive"));
        }
        if let Some(ref url) = self.notify.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(invalid(&format!(
                    "notify.webhook_url is not an http(s) url: '{}'",
                    url
                )));
            }
        }

        let uri = &self.mongo.uri;
        if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
            return Err(invalid(&format!(
                "mongo.uri is not a mongodb url: '{}'",
                uri
            )));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> anyhow::Error {
    ConfigError::Invalid {
        reason: reason.to_string(),
    }
    .into()
}
