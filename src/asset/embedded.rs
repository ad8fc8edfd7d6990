//! Compiled-in asset bundle
//!
//! Wraps any [`RustEmbed`] folder as an [`AssetSource`] mounted under a root
//! name. The embedded folder has no directory entries, so a directory exists
//! whenever some file path starts with it.

use std::borrow::Cow;
use std::io::{self, Cursor};
use std::marker::PhantomData;

use async_trait::async_trait;
use rust_embed::RustEmbed;

use super::path::AssetPath;
use super::source::{not_found, AssetMetadata, AssetSource};

/// The bundle shipped with the server binary
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

/// Asset source over a [`RustEmbed`] bundle
pub struct EmbeddedSource<E> {
    mount: AssetPath,
    _bundle: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> EmbeddedSource<E> {
    /// Mount the bundle under `root`, so `root/x` resolves to bundle file `x`
    pub fn new(root: &str) -> Self {
        Self {
            mount: AssetPath::root(root),
            _bundle: PhantomData,
        }
    }

    /// The mount point of the bundle
    pub fn mount(&self) -> &AssetPath {
        &self.mount
    }

    fn is_dir(relative: &str) -> bool {
        if relative.is_empty() {
            return true;
        }
        let prefix = format!("{}/", relative);
        E::iter().any(|name| name.starts_with(&prefix))
    }
}

#[async_trait]
impl<E: RustEmbed + 'static> AssetSource for EmbeddedSource<E> {
    type Reader = Cursor<Cow<'static, [u8]>>;

    async fn stat(&self, path: &AssetPath) -> io::Result<AssetMetadata> {
        let relative = path.strip_mount(&self.mount).ok_or_else(|| not_found(path))?;
        if let Some(file) = E::get(relative) {
            return Ok(AssetMetadata::file(file.data.len() as u64));
        }
        if Self::is_dir(relative) {
            return Ok(AssetMetadata::dir());
        }
        Err(not_found(path))
    }

    async fn open(&self, path: &AssetPath) -> io::Result<Self::Reader> {
        let relative = path.strip_mount(&self.mount).ok_or_else(|| not_found(path))?;
        E::get(relative)
            .map(|file| Cursor::new(file.data))
            .ok_or_else(|| not_found(path))
    }
}
