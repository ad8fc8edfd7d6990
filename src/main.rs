//! xpat server entry point

use anyhow::Context;
use xpat::asset::{application_router, Assets, AssetServer, DirSource, EmbeddedSource};
use xpat::logging::LoggingSystem;
use xpat::{ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("failed to load configuration")?;

    // Keep the system alive so the file writer keeps flushing
    let _logging_system = match LoggingSystem::init(config.logging.clone()) {
        Ok(system) => {
            if let Some(dir) = system.log_directory() {
                tracing::info!("Writing logs to {}", dir.display());
            }
            Some(system)
        }
        Err(e) => {
            eprintln!("Failed to initialize logging system: {}. Using basic logging.", e);
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
                .try_init()
                .ok();
            None
        }
    };

    tracing::info!("xpat {}", VERSION);

    match config.asset_dir.clone() {
        Some(dir) => {
            tracing::info!("Serving assets from {}", dir.display());
            let source = DirSource::new(&config.assets.root, dir);
            AssetServer::new(config, source)
                .start(application_router())
                .await?;
        }
        None => {
            let source = EmbeddedSource::<Assets>::new(&config.assets.root);
            AssetServer::new(config, source)
                .start(application_router())
                .await?;
        }
    }

    Ok(())
}
