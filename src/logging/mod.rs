//! Logging system for xpat
//!
//! Builds a `tracing` subscriber from [`LoggingConfig`]: an env filter, a
//! console layer and an optional rolling file layer.

mod config;


pub use config::{LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, DEFAULT_LOG_DIRECTORY};

use std::path::PathBuf;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Name of the log file inside the log directory
pub const LOG_FILE_NAME: &str = "xpat.log";

/// Logging system errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Invalid filter directive: {0}")]
    InvalidFilter(String),

    #[error("Failed to create log directory {path:?}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Installed logging system
///
/// Dropping it flushes and stops the file writer.
pub struct LoggingSystem {
    config: LoggingConfig,
    _guard: Option<WorkerGuard>,
}

impl LoggingSystem {
    /// Install the global subscriber described by `config`
    pub fn init(config: LoggingConfig) -> LoggingResult<Self> {
        let filter = Self::build_env_filter(&config)?;
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if config.output.to_console() {
            layers.push(Self::console_layer(&config));
        }
        if config.output.to_file() {
            let (layer, file_guard) = Self::file_layer(&config)?;
            layers.push(layer);
            guard = Some(file_guard);
        }

        tracing_subscriber::registry()
            .with(layers.with_filter(filter))
            .try_init()
            .map_err(|e| LoggingError::InitializationError(e.to_string()))?;

        Ok(Self {
            config,
            _guard: guard,
        })
    }

    /// `RUST_LOG` wins over the configured directives when set
    fn build_env_filter(config: &LoggingConfig) -> LoggingResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        let directives = config.directives();
        EnvFilter::try_new(&directives).map_err(|_| LoggingError::InvalidFilter(directives))
    }

    fn console_layer(config: &LoggingConfig) -> BoxedLayer {
        let layer = fmt::layer()
            .with_target(config.include_target)
            .with_thread_ids(config.include_thread_id)
            .with_file(config.include_file_info)
            .with_line_number(config.include_file_info);

        match config.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Text => layer.boxed(),
        }
    }

    fn file_layer(config: &LoggingConfig) -> LoggingResult<(BoxedLayer, WorkerGuard)> {
        let dir = config.file_directory();
        std::fs::create_dir_all(&dir).map_err(|source| LoggingError::DirectoryCreationError {
            path: dir.clone(),
            source,
        })?;

        let rotation = match config.rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        };
        let appender = RollingFileAppender::new(rotation, &dir, LOG_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(config.include_target)
            .with_thread_ids(config.include_thread_id)
            .with_file(config.include_file_info)
            .with_line_number(config.include_file_info);

        let layer = match config.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Text => layer.boxed(),
        };
        Ok((layer, guard))
    }

    /// Directory log files are written to, if file output is on
    pub fn log_directory(&self) -> Option<PathBuf> {
        self.config
            .output
            .to_file()
            .then(|| self.config.file_directory())
    }
}
