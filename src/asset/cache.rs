//! Entity tag cache and served-path tracking
//!
//! Both structures are owned by one handler instance and only ever grow.
//! Concurrent writers for the same key always carry the same value.

use dashmap::{DashMap, DashSet};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::path::AssetPath;

const HASH_BUFFER_SIZE: usize = 16 * 1024;

/// Compute the strong entity tag for a stream: quoted hex SHA-256 of its bytes
///
/// Reads the stream to the end; callers reusing it must rewind afterwards.
pub async fn compute_etag<R>(reader: &mut R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}

/// Lazily populated map from asset path to entity tag
#[derive(Debug, Default)]
pub struct EtagCache {
    entries: DashMap<AssetPath, String>,
}

impl EtagCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached entity tag
    pub fn get(&self, path: &AssetPath) -> Option<String> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    /// Return the cached tag for `path`, hashing `reader` on a miss
    ///
    /// Racing first lookups may each hash the asset; the first insert wins
    /// and every caller gets the stored value.
    pub async fn get_or_compute<R>(
        &self,
        path: &AssetPath,
        reader: &mut R,
    ) -> std::io::Result<String>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if let Some(etag) = self.get(path) {
            return Ok(etag);
        }

        let etag = compute_etag(reader).await?;
        let stored = self.entries.entry(path.clone()).or_insert(etag);
        Ok(stored.value().clone())
    }

    /// Number of cached tags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tag has been computed yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Set of paths that have been served with a full response
#[derive(Debug, Default)]
pub struct ServedSet {
    paths: DashSet<AssetPath>,
}

impl ServedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path, returning `true` the first time it is seen
    pub fn mark(&self, path: &AssetPath) -> bool {
        if self.paths.contains(path) {
            return false;
        }
        self.paths.insert(path.clone())
    }

    /// Whether a path has been served
    pub fn contains(&self, path: &AssetPath) -> bool {
        self.paths.contains(path)
    }

    /// Number of distinct paths served
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing has been served yet
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_compute_etag_format() {
        let etag = compute_etag(&mut Cursor::new(b"hi".to_vec())).await.unwrap();
        assert_eq!(
            etag,
            "\"8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4\""
        );
    }

    #[tokio::test]
    async fn test_compute_etag_spans_buffers() {
        let data = vec![7u8; HASH_BUFFER_SIZE * 3 + 5];
        let expected = format!("\"{}\"", hex::encode(Sha256::digest(&data)));
        let etag = compute_etag(&mut Cursor::new(data)).await.unwrap();
        assert_eq!(etag, expected);
    }

    #[tokio::test]
    async fn test_get_or_compute_caches_first_value() {
        let cache = EtagCache::new();
        let path = AssetPath::join("assets", "/hello.txt");
        assert!(cache.is_empty());

        let first = cache
            .get_or_compute(&path, &mut Cursor::new(b"hi".to_vec()))
            .await
            .unwrap();

        // A different stream for the same path must not replace the entry
        let second = cache
            .get_or_compute(&path, &mut Cursor::new(b"changed".to_vec()))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&path), Some(first));
    }

    #[test]
    fn test_served_set_marks_once() {
        let served = ServedSet::new();
        let path = AssetPath::join("assets", "/app.js");

        assert!(!served.contains(&path));
        assert!(served.mark(&path));
        assert!(!served.mark(&path));
        assert!(served.contains(&path));
        assert_eq!(served.len(), 1);
    }
}
