//! Server configuration
//!
//! Loaded from an optional JSON file. Every field has a serde default, so a
//! partial file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::asset::AssetConfig;
use crate::logging::LoggingConfig;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "XPAT_CONFIG";

/// Configuration file used when the environment variable is unset
pub const DEFAULT_CONFIG_FILE: &str = "xpat.json";

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (0 picks a free port)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Asset middleware settings
    #[serde(default)]
    pub assets: AssetConfig,

    /// Serve assets from this directory instead of the compiled-in bundle
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            assets: AssetConfig::default(),
            asset_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from a JSON file; a missing file gives the defaults
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load from the file named by `XPAT_CONFIG`, or `xpat.json`
    pub fn from_env() -> ConfigResult<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load(&path)
    }

    /// Parse and validate a JSON document
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: ServerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values that serde cannot
    pub fn validate(&self) -> ConfigResult<()> {
        self.assets.validate()?;
        self.socket_addr()?;
        Ok(())
    }

    /// The address to bind
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        let host = self.host.trim();
        let formatted = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        };
        formatted.parse().map_err(|_| ConfigError::InvalidValue {
            field: "host".to_string(),
            value: self.host.clone(),
        })
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the asset settings
    pub fn with_assets(mut self, assets: AssetConfig) -> Self {
        self.assets = assets;
        self
    }

    /// Serve assets from a directory on disk
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }
}
