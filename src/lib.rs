//! xpat - embedded asset middleware for axum
//!
//! Serves a read-only asset tree in front of an application router with
//! SHA-256 entity tags and conditional GET support:
//! - Asset sources: compiled-in bundle, in-memory map, directory on disk
//! - Per-handler entity tag cache safe under concurrent first access
//! - Missing assets and the server root fall through to the application

pub mod asset;
pub mod core;
pub mod logging;

// Re-export commonly used items
pub use asset::{AssetHandler, AssetServer, AssetSource, EmbeddedSource, MemorySource};
pub use core::config::ServerConfig;
pub use core::error::{Result, XpatError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
