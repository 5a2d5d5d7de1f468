//! Tracing initialization.
//! Builds a subscriber with EnvFilter, compact or JSON format, and optional file logging.
//!
//! Behavior:
//! - Console logs go to stderr; stdout is reserved for progress lines.
//! - The level comes from LogLevel; `RUST_LOG`, when set, takes precedence.
//! - A requested log file is refused (with a warning) when any ancestor is a symlink.

use anyhow::{bail, Context, Result};
use chrono::Local;
use mirror_backup::fs_ops::helpers::io_error_with_help;
use mirror_backup::output as out;
use mirror_backup::platform::open_log_file_secure_append;
use mirror_backup::{path_has_symlink_ancestor, LogLevel};
use std::fmt as stdfmt;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

fn open_file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    if path_has_symlink_ancestor(path).with_context(|| format!("check log path '{}'", path.display()))? {
        bail!("an ancestor of {} is a symlink", path.display());
    }
    let file = open_log_file_secure_append(path).map_err(io_error_with_help("open log file", path))?;
    Ok(tracing_appender::non_blocking(file))
}

/// Initialize tracing. Returns the file writer's guard, which must be held
/// until exit so buffered lines get flushed.
pub fn init_tracing(level: LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let file = match log_file {
        Some(path) => match open_file_writer(path) {
            Ok(pair) => Some(pair),
            Err(e) => {
                out::print_warn(&format!("File logging disabled: {e:#}. Logs continue on stderr."));
                None
            }
        },
        None => None,
    };
    let (file_writer, guard) = match file {
        Some((w, g)) => (Some(w), Some(g)),
        None => (None, None),
    };

    // `Option<Layer>` is itself a layer, so one registry shape covers every combination.
    let result = if json {
        let console = tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(io::stderr);
        let file_layer = file_writer.map(|w| {
            tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(w)
        });
        registry().with(env_filter(level)).with(console).with(file_layer).try_init()
    } else {
        let console = tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_target(false)
            .compact()
            .with_writer(io::stderr);
        let file_layer = file_writer.map(|w| {
            tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .compact()
                .with_writer(w)
        });
        registry().with(env_filter(level)).with(console).with(file_layer).try_init()
    };
    result.context("install tracing subscriber")?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_writer_creates_the_log() {
        let td = tempdir().unwrap();
        let base = dunce::canonicalize(td.path()).unwrap();
        let path = base.join("logs/run.log");
        let (_w, _g) = open_file_writer(&path).unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_writer_refuses_symlinked_parent() {
        let td = tempdir().unwrap();
        let real = td.path().join("real");
        std::fs::create_dir_all(&real).unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(open_file_writer(&link.join("run.log")).is_err());
        assert!(!real.join("run.log").exists());
    }
}
