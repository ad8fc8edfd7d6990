//! Application server
//!
//! Mounts the application routes behind the asset middleware and serves
//! them on the configured address.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::middleware::AssetHandler;
use super::source::AssetSource;
use crate::core::config::ServerConfig;
use crate::core::error::{Result, XpatError};

/// Application routes served behind the asset middleware
pub fn application_router() -> Router {
    Router::new()
        .route("/hello", get(|| async { "Hello, World!" }))
        .fallback(not_found)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found\n")
}

/// HTTP server fronting an application with an asset source
pub struct AssetServer<S: AssetSource> {
    config: ServerConfig,
    handler: Arc<AssetHandler<S>>,
}

impl<S: AssetSource> AssetServer<S> {
    /// Create a server over `source` using the asset settings in `config`
    pub fn new(config: ServerConfig, source: S) -> Self {
        let handler = Arc::new(AssetHandler::with_config(source, config.assets.clone()));
        Self { config, handler }
    }

    /// Get the asset handler (shared with the router)
    pub fn handler(&self) -> &Arc<AssetHandler<S>> {
        &self.handler
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Put `app` behind the asset middleware and request tracing
    pub fn build_router(&self, app: Router) -> Router {
        Arc::clone(&self.handler)
            .wrap(app)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until the listener fails
    pub async fn start(&self, app: Router) -> Result<()> {
        let addr: SocketAddr = self.config.socket_addr()?;
        let router = self.build_router(app);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| XpatError::BindFailed {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            "Server is running on http://{} (assets under {:?})",
            listener.local_addr().unwrap_or(addr),
            self.handler.root()
        );

        axum::serve(listener, router)
            .await
            .map_err(|e| XpatError::Internal(e.to_string()))?;

        Ok(())
    }
}
