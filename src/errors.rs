//! Typed error definitions for mirror_backup.
//! Precondition failures map to distinct exit codes; per-file failures are
//! caught by the reconciler, logged and counted.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("No source directory supplied")]
    NoSource,

    #[error("No destination directory supplied")]
    NoDestination,

    #[error("Source and destination are the same: {0}")]
    SameRoots(PathBuf),

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("'{inner}' must not be inside '{outer}'")]
    NestedRoots { inner: PathBuf, outer: PathBuf },

    #[error("Destination is unusable {path}: {reason}")]
    DestinationUnusable { path: PathBuf, reason: String },

    #[error("Trash directory {path} is invalid: {reason}")]
    InvalidTrash { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("{path} is not under {root}")]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Refusing to delete {path}: not inside destination {root}")]
    RefusedOutsideDestination { path: PathBuf, root: PathBuf },

    #[error("Insufficient disk space for {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u64,
        available: u64,
        dest: PathBuf,
    },

    #[error("{message}")]
    Io {
        op: &'static str,
        path: PathBuf,
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl MirrorError {
    /// Process exit code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            MirrorError::NoSource => 1,
            MirrorError::NoDestination => 2,
            MirrorError::SameRoots(_) => 3,
            MirrorError::SourceNotFound(_) => 4,
            MirrorError::NestedRoots { .. } => 5,
            MirrorError::DestinationUnusable { .. } => 6,
            MirrorError::InvalidTrash { .. } => 7,
            MirrorError::Config(_) => 8,
            MirrorError::Logging(_) => 9,
            MirrorError::Interrupted => 130,
            MirrorError::PathOutsideRoot { .. }
            | MirrorError::RefusedOutsideDestination { .. }
            | MirrorError::InsufficientSpace { .. }
            | MirrorError::Io { .. } => 10,
        }
    }

    /// True for errors raised before reconciliation starts.
    pub fn is_precondition(&self) -> bool {
        matches!(self.code(), 1..=8)
    }

    /// Short machine-friendly kind used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            MirrorError::NoSource => "no_source",
            MirrorError::NoDestination => "no_destination",
            MirrorError::SameRoots(_) => "same_roots",
            MirrorError::SourceNotFound(_) => "source_not_found",
            MirrorError::NestedRoots { .. } => "nested_roots",
            MirrorError::DestinationUnusable { .. } => "destination_unusable",
            MirrorError::InvalidTrash { .. } => "invalid_trash",
            MirrorError::Config(_) => "config",
            MirrorError::Logging(_) => "logging",
            MirrorError::PathOutsideRoot { .. } => "path_outside_root",
            MirrorError::RefusedOutsideDestination { .. } => "refused_outside_destination",
            MirrorError::InsufficientSpace { .. } => "insufficient_space",
            MirrorError::Io { .. } => "io",
            MirrorError::Interrupted => "interrupted",
        }
    }
}
