//! xpat core module
//!
//! Top-level error type and server configuration shared by the asset
//! middleware, the logging system and the binary.

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{ConfigError, ConfigResult, ServerConfig};
pub use error::{Result, XpatError};
