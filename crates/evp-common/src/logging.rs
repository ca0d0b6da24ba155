//! Logging configuration and initialization
//!
//! One `tracing` subscriber for the whole process, configured from the
//! environment. Supports console output, file output, or both. File output
//! writes a single log file per process start, with the start timestamp
//! embedded in the file name (`<prefix>_<YYYYmmdd_HHMMSS>.log`).
//!
//! Library code must use the structured logging macros (`debug!`, `info!`,
//! `warn!`, `error!`) rather than `println!`.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output target for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// Output to console only
    #[default]
    Console,
    /// Output to file only
    File,
    /// Output to both console and file
    Both,
}

impl std::str::FromStr for LogOutput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(anyhow::anyhow!("Invalid log output: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Output target (console, file, or both)
    pub output: LogOutput,

    /// Directory for log files (only used when output includes file)
    pub log_dir: PathBuf,

    /// Log file name prefix (e.g., "evp" -> "evp_20240615_080000.log")
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::Console,
            log_dir: PathBuf::from("./logs"),
            file_prefix: "evp".to_string(),
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    ///
    /// - `LOG_LEVEL`: trace, debug, info, warn, error
    /// - `LOG_OUTPUT`: console, file, both
    /// - `LOG_DIR`: directory for log files
    /// - `LOG_FILE_PREFIX`: prefix for log file names
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.level = level.parse().context("Failed to parse LOG_LEVEL")?;
        }

        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            config.output = output.parse()?;
        }

        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Ok(prefix) = std::env::var("LOG_FILE_PREFIX") {
            config.file_prefix = prefix;
        }

        Ok(config)
    }
}

/// Initialize logging with the given configuration
///
/// Installs the global tracing subscriber; call once at process startup.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());

    match config.output {
        LogOutput::Console => {
            let console_layer = fmt::layer().with_writer(std::io::stdout);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .try_init()?;
        },
        LogOutput::File => {
            let file_layer = fmt::layer().with_writer(file_writer(config)?).with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .try_init()?;
        },
        LogOutput::Both => {
            let console_layer = fmt::layer().with_writer(std::io::stdout);
            let file_layer = fmt::layer().with_writer(file_writer(config)?).with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .try_init()?;
        },
    }

    Ok(())
}

/// Build the non-blocking writer for file output
///
/// One log file per process start; the name embeds the start timestamp.
fn file_writer(config: &LogConfig) -> Result<BoxMakeWriter> {
    std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

    let file_name = format!(
        "{}_{}.log",
        config.file_prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let appender = tracing_appender::rolling::never(&config.log_dir, file_name);

    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    // The guard must stay alive for the process lifetime
    std::mem::forget(guard);

    Ok(BoxMakeWriter::new(non_blocking))
}
