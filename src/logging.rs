//! Logging flags and subscriber setup for host binaries.
//!
//! stdout carries frames, so every event is written to stderr no matter which
//! format is chosen.

use clap::{Args, ValueEnum};
use tracing::level_filters::LevelFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event, for hosts whose stderr is collected by a log shipper.
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Nothing at all, for browsers that surface host stderr to the user.
    Off,
    Error,
    Warn,
    Info,
    Debug,
    /// Includes one event per frame sent and received.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// `--log-format` / `--log-level`, flattened into a host's CLI.
///
/// Chrome launches hosts with only the extension origin on the command line,
/// so both flags also read from the environment.
#[derive(Args, Debug, Clone, Copy)]
pub struct LogArgs {
    /// Log output format (stderr).
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text", env = "NM_LOG_FORMAT")]
    pub format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", env = "NM_LOG_LEVEL")]
    pub level: LogLevel,
}

impl LogArgs {
    /// Install the global stderr subscriber.
    ///
    /// Returns `false` when logging is off or another subscriber was already
    /// installed; the host keeps running either way.
    pub fn init(self) -> bool {
        if self.level == LogLevel::Off {
            return false;
        }

        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(LevelFilter::from(self.level))
            .with_ansi(false)
            .with_target(true);

        match self.format {
            LogFormat::Text => builder.try_init().is_ok(),
            LogFormat::Json => builder.json().try_init().is_ok(),
        }
    }
}
