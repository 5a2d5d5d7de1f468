//! Progress reporting seam between the reconciler and whatever displays it.
//!
//! The reconciler emits `Progress` events; a `Reporter` decides where they go.
//! `ConsoleReporter` prints them, `MemoryReporter` keeps them for inspection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::classify::Disposition;
use super::stats::RunStatistics;
use crate::output as out;

/// One user-visible progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Start of the forward pass.
    Backup { source: PathBuf, dest: PathBuf, test_mode: bool },
    /// Start of the reverse pass.
    ReverseScan { source: PathBuf, dest: PathBuf, test_mode: bool },
    CreatedDir(PathBuf),
    Copying { disposition: Disposition, name: String },
    Deleting { disposition: Disposition, name: String },
    RemovingEmptyDir(PathBuf),
    /// A per-entry operation that failed; the run continues.
    Failed { op: &'static str, name: String, cause: String },
    Summary(RunStatistics),
}

impl Progress {
    pub fn is_failure(&self) -> bool {
        matches!(self, Progress::Failed { .. })
    }
}

fn mode_suffix(test_mode: bool) -> &'static str {
    if test_mode { " in test mode" } else { "" }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Backup { source, dest, test_mode } => write!(
                f,
                "Backing up {} -> {}{}",
                source.display(),
                dest.display(),
                mode_suffix(*test_mode)
            ),
            Progress::ReverseScan { source, dest, test_mode } => write!(
                f,
                "Reverse Scan :: {} -> {}{}",
                dest.display(),
                source.display(),
                mode_suffix(*test_mode)
            ),
            Progress::CreatedDir(dir) => write!(f, "Created {}", dir.display()),
            Progress::Copying { disposition, name } => write!(f, "Copying : {disposition} :: {name}"),
            Progress::Deleting { disposition, name } => write!(f, "Deleting : {disposition} :: {name}"),
            Progress::RemovingEmptyDir(dir) => write!(f, "Removing empty directory {}", dir.display()),
            Progress::Failed { op, name, cause } => write!(f, "ERROR :: {cause} : could not {op} {name}"),
            Progress::Summary(stats) => write!(f, "{stats}"),
        }
    }
}

/// Display name for a progress line: the final path component.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sink for progress events. Called from worker threads in parallel mode.
pub trait Reporter: Send + Sync {
    fn report(&self, event: Progress);
}

/// Prints events to the terminal; failures go to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: Progress) {
        match &event {
            Progress::Failed { .. } => out::print_error(&event.to_string()),
            Progress::ReverseScan { .. } => {
                out::print_user("-----------------------------------------------------------------");
                out::print_user(&event.to_string());
            }
            Progress::Summary(_) => {
                out::print_user("");
                out::print_user(event.to_string().trim_end());
            }
            _ => out::print_user(&event.to_string()),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<Progress>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Progress> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Rendered lines, one per event.
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: Progress) {
        if let Ok(mut g) = self.events.lock() {
            g.push(event);
        }
    }
}
