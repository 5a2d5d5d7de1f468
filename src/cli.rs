//! CLI definition and parsing.
//! Defines Args and how flags override a loaded Config.
//!
//! Notes:
//! - `--debug` is a shorthand for `--log-level debug` and wins over it.
//! - Boolean flags only ever switch a setting on; the config file can't be
//!   overridden back to `false` from the command line.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};

/// Keep a backup directory in step with a source directory.
///
/// New and changed files are copied across, files removed from the source are
/// removed from the backup (moved to the trash unless --zap), and directories
/// left empty are pruned. CLI flags override values from config.xml.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to back up.
    #[arg(short = 's', long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Backup directory (created if missing).
    #[arg(short = 'd', long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub destination: Option<PathBuf>,

    /// Test mode: report what would be done without changing anything.
    #[arg(short = 't', long = "test")]
    pub test: bool,

    /// Delete removed files permanently instead of moving them to the trash.
    #[arg(short = 'z', long)]
    pub zap: bool,

    /// Where deleted files are kept (default: <data dir>/mirror_backup/trash).
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub trash_dir: Option<PathBuf>,

    /// Copy permission bits along with contents and timestamps.
    #[arg(long)]
    pub preserve_permissions: bool,

    /// Worker threads per pass (1 = sequential).
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(long)]
    pub debug: bool,

    /// Also write logs to this file.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the config file location and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write a template config file (if none exists) and exit.
    #[arg(long)]
    pub init_config: bool,

    /// Print the license notice and exit.
    #[arg(short = 'l', long)]
    pub license: bool,
}

impl Args {
    /// Precedence: --debug > --log-level > None (use config).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(src) = &self.source {
            cfg.source = Some(src.clone());
        }
        if let Some(dst) = &self.destination {
            cfg.destination = Some(dst.clone());
        }
        if let Some(trash) = &self.trash_dir {
            cfg.trash_dir = Some(trash.clone());
        }
        if let Some(file) = &self.log_file {
            cfg.log_file = Some(file.clone());
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(jobs) = self.jobs {
            cfg.jobs = usize::from(jobs);
        }
        cfg.test_mode |= self.test;
        cfg.zap |= self.zap;
        cfg.preserve_permissions |= self.preserve_permissions;
    }
}

pub fn parse() -> Args {
    Args::parse()
}
