//! Embedded Asset Middleware
//!
//! Serves files from a read-only asset source in front of an application
//! router:
//! - GET requests for regular assets are answered directly
//! - `If-None-Match` is checked against a content hash (SHA-256) cached per path
//! - Missing assets, non-GET requests and the server root fall through
//! - Directories are never listed and answer 404

mod cache;
mod config;
mod content;
mod dir;
mod embedded;
mod error;
mod memory;
mod middleware;
mod path;
mod server;
mod source;

pub use cache::{compute_etag, EtagCache, ServedSet};
pub use config::{AssetConfig, DEFAULT_ASSET_ROOT};
pub use content::{content_type_for, parse_range, serve_content, ByteRange, RangeOutcome};
pub use dir::DirSource;
pub use embedded::{Assets, EmbeddedSource};
pub use error::AssetError;
pub use memory::MemorySource;
pub use middleware::{embedded_assets, AssetHandler};
pub use path::AssetPath;
pub use server::{application_router, AssetServer};
pub use source::{AssetMetadata, AssetSource};
