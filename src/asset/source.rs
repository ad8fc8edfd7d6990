//! Asset source contract
//!
//! An asset source is a read-only hierarchical byte store. The middleware
//! only ever stats and opens entries; nothing is written back.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncSeek};

use super::path::AssetPath;

/// Metadata for a single entry, queried fresh on every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub len: u64,
    /// Whether readers opened for this entry support random access
    pub seekable: bool,
}

impl AssetMetadata {
    /// Metadata for a regular, seekable asset
    pub fn file(len: u64) -> Self {
        Self {
            is_dir: false,
            len,
            seekable: true,
        }
    }

    /// Metadata for a directory entry
    pub fn dir() -> Self {
        Self {
            is_dir: true,
            len: 0,
            seekable: false,
        }
    }

    /// Override the seekable capability
    pub fn with_seekable(mut self, seekable: bool) -> Self {
        self.seekable = seekable;
        self
    }
}

/// Read-only store of named assets
///
/// `stat` and `open` report a missing entry with [`io::ErrorKind::NotFound`];
/// every other error kind is treated as a failure of the source itself.
#[async_trait]
pub trait AssetSource: Send + Sync + 'static {
    /// Reader returned by [`AssetSource::open`]
    type Reader: AsyncRead + AsyncSeek + Send + Unpin + 'static;

    /// Query metadata for an entry
    async fn stat(&self, path: &AssetPath) -> io::Result<AssetMetadata>;

    /// Open a regular asset for reading
    async fn open(&self, path: &AssetPath) -> io::Result<Self::Reader>;

    /// Check that an entry exists and is not a directory
    async fn is_file(&self, path: &AssetPath) -> io::Result<bool> {
        match self.stat(path).await {
            Ok(metadata) => Ok(!metadata.is_dir),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Build the error sources return for a missing entry
pub(crate) fn not_found(path: &AssetPath) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{}: no such asset", path))
}
