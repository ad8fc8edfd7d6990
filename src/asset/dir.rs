//! Disk-backed asset source
//!
//! Serves a directory on disk under a root name. Metadata is read from the
//! filesystem on every call; nothing is cached, so edits show up on the next
//! request.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};

use super::path::AssetPath;
use super::source::{not_found, AssetMetadata, AssetSource};

/// Asset source over a directory tree
#[derive(Debug, Clone)]
pub struct DirSource {
    mount: AssetPath,
    base: PathBuf,
}

impl DirSource {
    /// Serve `base` so that `root/x` resolves to `base/x`
    pub fn new(root: &str, base: impl Into<PathBuf>) -> Self {
        Self {
            mount: AssetPath::root(root),
            base: base.into(),
        }
    }

    /// The directory being served
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, path: &AssetPath) -> io::Result<PathBuf> {
        let relative = path.strip_mount(&self.mount).ok_or_else(|| not_found(path))?;
        let mut resolved = self.base.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            // Reject anything the OS would read as more than one plain name
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) if name == segment => resolved.push(name),
                _ => return Err(not_found(path)),
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl AssetSource for DirSource {
    type Reader = File;

    async fn stat(&self, path: &AssetPath) -> io::Result<AssetMetadata> {
        let resolved = self.resolve(path)?;
        let metadata = fs::metadata(&resolved)
            .await
            .map_err(|e| missing_as_not_found(path, e))?;
        if metadata.is_dir() {
            return Ok(AssetMetadata::dir());
        }
        Ok(AssetMetadata::file(metadata.len()).with_seekable(metadata.is_file()))
    }

    async fn open(&self, path: &AssetPath) -> io::Result<Self::Reader> {
        let resolved = self.resolve(path)?;
        File::open(resolved)
            .await
            .map_err(|e| missing_as_not_found(path, e))
    }
}

/// A path running through a regular file names nothing
fn missing_as_not_found(path: &AssetPath, err: io::Error) -> io::Error {
    if err.kind() == io::ErrorKind::NotADirectory {
        not_found(path)
    } else {
        err
    }
}
