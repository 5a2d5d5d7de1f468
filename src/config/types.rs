//! Core configuration types.
//! - `Config` holds the merged settings (defaults, then XML, then CLI flags).
//! - `LogLevel` is the user-facing verbosity knob.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Warnings and errors (default)
    #[default]
    Normal,
    /// Phase boundaries and summaries
    Info,
    /// Per-file decisions
    Debug,
}

impl LogLevel {
    /// Case-insensitive, with a few aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" | "warn" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Directive for `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}' (expected quiet|normal|info|debug)"))
    }
}

/// Settings for one run, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    /// Report what would happen without touching the filesystem
    pub test_mode: bool,
    /// Delete permanently instead of moving into the trash
    pub zap: bool,
    /// Trash base; `None` means the platform data dir
    pub trash_dir: Option<PathBuf>,
    pub preserve_permissions: bool,
    pub jobs: usize,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            test_mode: false,
            zap: false,
            trash_dir: None,
            preserve_permissions: false,
            jobs: 1,
            log_level: LogLevel::Normal,
            log_file: None,
        }
    }
}

impl Config {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(source.into()),
            destination: Some(destination.into()),
            ..Default::default()
        }
    }
}
