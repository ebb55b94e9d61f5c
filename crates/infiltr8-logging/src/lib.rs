//! Structured logging for Infiltr8
//!
//! Installs a `tracing` subscriber configured from a [`LogConfig`]:
//!
//! - **Console**: human-readable lines or JSONL (the default)
//! - **File**: JSONL with daily/hourly rotation via tracing-appender
//! - **Player Context**: spans opened under a [`PlayerContextGuard`] are
//!   attributed to that player
//! - **Filtering**: `RUST_LOG` overrides the configured default level
//!
//! # Quick Start
//!
//! ```ignore
//! use infiltr8_logging::{Infiltr8SubscriberBuilder, LogConfig};
//!
//! // JSONL to console
//! let _guard = Infiltr8SubscriberBuilder::new().init();
//!
//! // Pretty output while developing
//! let _guard = Infiltr8SubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! Keep the returned guard alive for as long as file output is needed;
//! dropping it flushes and stops the background writer.

pub mod config;
pub mod context;
pub mod layers;

pub use config::{
    ConsoleConfig, ConsoleTarget, FileConfig, JsonlConfig, LogConfig, RotationStrategy,
};
pub use context::{PlayerContextData, PlayerContextGuard};
pub use layers::{PlayerContextExtension, PlayerContextLayer};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to prepare log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create rolling appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Builder for configuring and installing the global subscriber
pub struct Infiltr8SubscriberBuilder {
    config: LogConfig,
}

impl Infiltr8SubscriberBuilder {
    /// Default: JSONL output to console
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default filter directive
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Install the subscriber, reporting failures on stderr
    ///
    /// Returns the file writer guard when file output is enabled.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: logging not initialized: {}", e);
                None
            }
        }
    }

    /// Install the subscriber
    ///
    /// Fails if a global subscriber is already set or the log file
    /// cannot be created.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.default_level));

        let console = &self.config.console;
        let pretty_console = (console.enabled && console.pretty).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(console.ansi)
                .with_target(true)
                .with_writer(console_writer(console.target))
        });
        let json_console = (console.enabled && !console.pretty)
            .then(|| layers::jsonl_layer(console_writer(console.target), &self.config.jsonl));

        let (file_layer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = file_writer(file_config)?;
                (
                    Some(layers::jsonl_layer(writer, &self.config.jsonl)),
                    Some(guard),
                )
            }
            None => (None, None),
        };

        Registry::default()
            .with(env_filter)
            .with(PlayerContextLayer::new())
            .with(pretty_console)
            .with(json_console)
            .with(file_layer)
            .try_init()?;

        Ok(guard)
    }
}

impl Default for Infiltr8SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn console_writer(target: ConsoleTarget) -> BoxMakeWriter {
    match target {
        ConsoleTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        ConsoleTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
    }
}

/// Non-blocking writer for the configured file output
///
/// `Never` truncates a single `<prefix>.log`; the rotating strategies
/// append to dated files and prune beyond `max_files`.
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&config.directory)?;

    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.prefix)
        .filename_suffix("jsonl");
    if let Some(max) = config.max_files {
        builder = builder.max_log_files(max);
    }
    let appender = builder.build(&config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// JSONL to console
pub fn init_default() -> Option<WorkerGuard> {
    Infiltr8SubscriberBuilder::new().init()
}

/// Verbose pretty console output
pub fn init_development() -> Option<WorkerGuard> {
    Infiltr8SubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Warnings only; safe to call from many tests
pub fn init_testing() {
    let _ = Infiltr8SubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
