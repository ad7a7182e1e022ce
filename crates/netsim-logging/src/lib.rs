//! Logging setup for the NetSim topology simulator
//!
//! Wraps `tracing-subscriber` so the CLI, the tests and any embedding
//! front-end configure output the same way.
//!
//! # Features
//!
//! - **Pretty console**: human-readable output for interactive runs (default)
//! - **JSONL output**: structured JSON lines for the console or a log file
//! - **File Rotation**: daily/hourly log rotation via tracing-appender
//! - **RUST_LOG**: the environment filter always wins over the configured level
//!
//! # Quick Start
//!
//! ```ignore
//! use netsim_logging::{LogConfig, SubscriberBuilder};
//!
//! // Pretty console output at `info`
//! let _guard = SubscriberBuilder::new().init();
//!
//! // Debug output, as `netsim -v` does
//! let _guard = SubscriberBuilder::new()
//!     .with_config(LogConfig::verbose())
//!     .init();
//! ```
//!
//! Keep the returned guard alive for as long as file output should be flushed.

pub mod config;

pub use config::{ConsoleConfig, FileConfig, JsonlConfig, LogConfig, RotationStrategy};

use std::fs::{self, File};
use std::io;

use thiserror::Error;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the global subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log file: {0}")]
    Io(#[from] io::Error),

    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Builder for configuring and initializing the NetSim logging subscriber
///
/// By default, console output is human-readable. Use [`LogConfig::run_log`]
/// to also keep JSONL files.
pub struct SubscriberBuilder {
    config: LogConfig,
}

impl SubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Switch the console between pretty and JSONL output
    pub fn with_pretty_console(mut self, pretty: bool) -> Self {
        self.config.console.pretty = pretty;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// The configuration this builder will install
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Initialize the subscriber globally
    ///
    /// Failures (an existing global subscriber, an unwritable log directory)
    /// are reported on stderr and leave logging as it was.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: failed to initialize logging: {}", e);
                None
            }
        }
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns the file writer guard when file output is configured.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.default_level));

        let file_writer = match &self.config.file {
            Some(file_config) => Some(create_file_writer(file_config)?),
            None => None,
        };

        let registry = Registry::default().with(env_filter);
        let jsonl = &self.config.jsonl;
        let ansi = self.config.console.ansi;

        // Separate arms per layer combination keep the subscriber types concrete
        match (self.config.console.enabled, self.config.console.pretty, file_writer) {
            (true, true, Some((writer, guard))) => {
                registry
                    .with(pretty_console_layer(ansi))
                    .with(jsonl_layer(jsonl, writer))
                    .try_init()?;
                Ok(Some(guard))
            }
            (true, false, Some((writer, guard))) => {
                registry
                    .with(jsonl_layer(jsonl, std::io::stdout))
                    .with(jsonl_layer(jsonl, writer))
                    .try_init()?;
                Ok(Some(guard))
            }
            (false, _, Some((writer, guard))) => {
                registry.with(jsonl_layer(jsonl, writer)).try_init()?;
                Ok(Some(guard))
            }
            (true, true, None) => {
                registry.with(pretty_console_layer(ansi)).try_init()?;
                Ok(None)
            }
            (true, false, None) => {
                registry.with(jsonl_layer(jsonl, std::io::stdout)).try_init()?;
                Ok(None)
            }
            (false, _, None) => {
                registry.try_init()?;
                Ok(None)
            }
        }
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable console layer
fn pretty_console_layer<S>(ansi: bool) -> impl Layer<S>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
}

/// Create a JSONL formatting layer writing to `writer`
pub fn jsonl_layer<S, W>(config: &JsonlConfig, writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(writer)
}

/// Open the log file writer; truncates for `Never` rotation, appends otherwise
fn create_file_writer(file_config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&file_config.directory)?;
    let writer = match file_config.rotation {
        RotationStrategy::Never => {
            let file_path = file_config
                .directory
                .join(format!("{}.log", file_config.prefix));
            tracing_appender::non_blocking(File::create(file_path)?)
        }
        RotationStrategy::Daily => tracing_appender::non_blocking(RollingFileAppender::new(
            Rotation::DAILY,
            &file_config.directory,
            &file_config.prefix,
        )),
        RotationStrategy::Hourly => tracing_appender::non_blocking(RollingFileAppender::new(
            Rotation::HOURLY,
            &file_config.directory,
            &file_config.prefix,
        )),
    };
    Ok(writer)
}

/// Initialize logging for testing (minimal output, safe to call repeatedly)
pub fn init_testing() {
    let _ = SubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
