//! Asset middleware configuration

use serde::{Deserialize, Serialize};

use crate::core::config::ConfigError;

/// Default name of the asset root inside a source
pub const DEFAULT_ASSET_ROOT: &str = "assets";

/// Asset middleware configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Root name prefixed to every request path
    #[serde(default = "default_root")]
    pub root: String,

    /// Send an `ETag` header on full responses
    ///
    /// Off by default: tags are then only computed for requests that carry
    /// `If-None-Match`.
    #[serde(default)]
    pub emit_etag: bool,
}

fn default_root() -> String {
    DEFAULT_ASSET_ROOT.to_string()
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            emit_etag: false,
        }
    }
}

impl AssetConfig {
    /// Create a configuration with a custom root name
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Enable or disable the `ETag` header on full responses
    pub fn with_emit_etag(mut self, emit: bool) -> Self {
        self.emit_etag = emit;
        self
    }

    /// Check that the root is a plain relative path
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = self.root.trim().is_empty()
            || self.root.starts_with('/')
            || self
                .root
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..");

        if invalid {
            return Err(ConfigError::InvalidValue {
                field: "assets.root".to_string(),
                value: self.root.clone(),
            });
        }
        Ok(())
    }
}
