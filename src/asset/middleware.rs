//! Embedded asset middleware
//!
//! Sits in front of an application router. GET requests that name a regular
//! asset are answered from the source; everything else, including missing
//! assets and the server root, is passed on to the wrapped handler.

use std::io::SeekFrom;
use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    extract::{Request, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio::io::AsyncSeekExt;

use super::cache::{EtagCache, ServedSet};
use super::config::AssetConfig;
use super::content::serve_content;
use super::error::AssetError;
use super::path::AssetPath;
use super::source::AssetSource;

/// What the middleware decided to do with a request
enum Resolution {
    /// Hand the request to the wrapped handler
    Fallthrough,
    /// Answer directly
    Respond(Response),
}

/// Conditional asset handler state
///
/// Owns the entity tag cache and the served set for its lifetime, so every
/// instance starts cold. The modification time reported for all assets is
/// fixed when the handler is built.
pub struct AssetHandler<S: AssetSource> {
    source: Arc<S>,
    config: AssetConfig,
    modified: SystemTime,
    etags: EtagCache,
    served: ServedSet,
}

impl<S: AssetSource> AssetHandler<S> {
    /// Create a handler with the default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, AssetConfig::default())
    }

    /// Create a handler with a custom configuration
    pub fn with_config(source: S, config: AssetConfig) -> Self {
        Self::with_shared_source(Arc::new(source), config)
    }

    /// Create a handler over a source shared with other owners
    pub fn with_shared_source(source: Arc<S>, config: AssetConfig) -> Self {
        Self {
            source,
            config,
            modified: SystemTime::now(),
            etags: EtagCache::new(),
            served: ServedSet::new(),
        }
    }

    /// Asset root name
    pub fn root(&self) -> &str {
        &self.config.root
    }

    /// Handler configuration
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// The asset source
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Modification time reported for every asset
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Entity tags computed so far
    pub fn etags(&self) -> &EtagCache {
        &self.etags
    }

    /// Paths served with a full response so far
    pub fn served(&self) -> &ServedSet {
        &self.served
    }

    /// Map a request path into the asset tree
    pub fn asset_path(&self, url_path: &str) -> AssetPath {
        AssetPath::join(&self.config.root, url_path)
    }

    /// Layer this handler over an application router
    ///
    /// Routes and the fallback must already be registered on `router`.
    pub fn wrap(self: Arc<Self>, router: Router) -> Router {
        router.layer(middleware::from_fn_with_state(self, embedded_assets::<S>))
    }

    /// Run the middleware for one request
    pub async fn handle(&self, request: Request, next: Next) -> Response {
        let (parts, body) = request.into_parts();

        match self.resolve(&parts).await {
            Ok(Resolution::Respond(response)) => response,
            Ok(Resolution::Fallthrough) => next.run(Request::from_parts(parts, body)).await,
            Err(err) => {
                if err.is_server_error() {
                    tracing::error!("{} {}: {}", parts.method, parts.uri.path(), err);
                } else {
                    tracing::info!("{} {}: {}", parts.method, parts.uri.path(), err);
                }
                err.into_response()
            }
        }
    }

    async fn resolve(&self, parts: &Parts) -> Result<Resolution, AssetError> {
        if parts.method != Method::GET {
            return Ok(Resolution::Fallthrough);
        }

        let url_path = parts.uri.path();
        let path = self.asset_path(url_path);

        let metadata = match self.source.stat(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::trace!("{} {}: {}: does not exist", parts.method, url_path, path);
                return Ok(Resolution::Fallthrough);
            }
            Err(source) => {
                return Err(AssetError::Stat {
                    path: path.to_string(),
                    source,
                })
            }
        };

        if metadata.is_dir {
            // The server root belongs to the application, not the asset tree
            if url_path == "/" {
                tracing::info!("{} {}: {}: is the root", parts.method, url_path, path);
                return Ok(Resolution::Fallthrough);
            }
            return Err(AssetError::DirectoryRequested {
                path: path.to_string(),
            });
        }

        let mut reader = self.source.open(&path).await.map_err(|source| AssetError::Open {
            path: path.to_string(),
            source,
        })?;

        let if_none_match = parts
            .headers
            .get(header::IF_NONE_MATCH)
            .filter(|value| !value.as_bytes().trim_ascii().is_empty());

        let etag = if if_none_match.is_some() || self.config.emit_etag {
            let etag = self
                .etags
                .get_or_compute(&path, &mut reader)
                .await
                .map_err(|source| AssetError::Hash {
                    path: path.to_string(),
                    source,
                })?;
            Some(etag)
        } else {
            None
        };

        if let (Some(if_none_match), Some(etag)) = (if_none_match, etag.as_deref()) {
            if if_none_match.as_bytes() == etag.as_bytes() {
                return Ok(Resolution::Respond(self.not_modified(etag)));
            }
        }

        if !metadata.seekable {
            return Err(AssetError::NotSeekable {
                path: path.to_string(),
            });
        }

        // Hashing may have consumed the stream
        if etag.is_some() {
            reader
                .seek(SeekFrom::Start(0))
                .await
                .map_err(|source| AssetError::Seek {
                    path: path.to_string(),
                    source,
                })?;
        }

        if self.served.mark(&path) {
            tracing::info!("{} {}: {}: served", parts.method, url_path, path);
        }

        let response_etag = if self.config.emit_etag { etag.as_deref() } else { None };
        let response = serve_content(
            &parts.method,
            &parts.headers,
            url_path,
            self.modified,
            response_etag,
            reader,
        )
        .await
        .map_err(|source| AssetError::Seek {
            path: path.to_string(),
            source,
        })?;

        Ok(Resolution::Respond(response))
    }

    fn not_modified(&self, etag: &str) -> Response {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        if self.config.emit_etag {
            if let Ok(value) = HeaderValue::from_str(etag) {
                response.headers_mut().insert(header::ETAG, value);
            }
        }
        response
    }
}

/// Asset middleware function for [`axum::middleware::from_fn_with_state`]
pub async fn embedded_assets<S: AssetSource>(
    State(handler): State<Arc<AssetHandler<S>>>,
    request: Request,
    next: Next,
) -> Response {
    handler.handle(request, next).await
}
