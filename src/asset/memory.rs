//! In-memory asset source
//!
//! Holds a bundle built at runtime. Keys are full asset paths, root name
//! included, and directories are implied by the keys below them.

use std::collections::BTreeMap;
use std::io::{self, Cursor};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;

use super::path::AssetPath;
use super::source::{not_found, AssetMetadata, AssetSource};

/// Asset source backed by a sorted map of paths to contents
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, normalizing its path
    pub fn with_file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file, normalizing its path
    pub fn insert(&mut self, path: &str, contents: impl AsRef<[u8]>) {
        let key = AssetPath::join("", path);
        self.files
            .insert(key.as_str().to_string(), Arc::from(contents.as_ref()));
    }

    /// Number of files in the bundle
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the bundle holds no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn has_children(&self, path: &AssetPath) -> bool {
        if path.as_str() == "." {
            return !self.files.is_empty();
        }
        let prefix = format!("{}/", path);
        self.files
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .next()
            .map_or(false, |(key, _)| key.starts_with(&prefix))
    }
}

#[async_trait]
impl AssetSource for MemorySource {
    type Reader = Cursor<Arc<[u8]>>;

    async fn stat(&self, path: &AssetPath) -> io::Result<AssetMetadata> {
        if let Some(contents) = self.files.get(path.as_str()) {
            return Ok(AssetMetadata::file(contents.len() as u64));
        }
        if self.has_children(path) {
            return Ok(AssetMetadata::dir());
        }
        Err(not_found(path))
    }

    async fn open(&self, path: &AssetPath) -> io::Result<Self::Reader> {
        match self.files.get(path.as_str()) {
            Some(contents) => Ok(Cursor::new(Arc::clone(contents))),
            None if self.has_children(path) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{}: is a directory", path),
            )),
            None => Err(not_found(path)),
        }
    }
}
