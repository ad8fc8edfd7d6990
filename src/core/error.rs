//! Error types for xpat

use thiserror::Error;

use super::config::ConfigError;
use crate::asset::AssetError;

/// Result type alias for xpat operations
pub type Result<T> = std::result::Result<T, XpatError>;

/// Main error type for xpat
#[derive(Error, Debug)]
pub enum XpatError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server bind failed on {addr}: {reason}")]
    BindFailed { addr: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
