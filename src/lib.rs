//! Core library for `mirror_backup`.
//!
//! Keeps a destination directory an exact copy of a source directory:
//! new and changed files are copied, files gone from the source are removed
//! (or moved to a trash area), and directories left empty are pruned.
//!
//! The binary is a thin layer over this crate: it merges config and CLI flags,
//! calls [`config::validate`] and hands the result to [`run_mirror`].

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod mirror;
pub mod output;
pub mod platform;
pub mod shutdown;
mod utils;

pub use config::{config_path, default_trash_dir, path_has_symlink_ancestor, Config, LogLevel};
pub use errors::MirrorError;
pub use mirror::classify::{classify_forward, classify_reverse, classify_reverse_link, ChangeReason, Disposition, FileRecord};
pub use mirror::report::{ConsoleReporter, MemoryReporter, Progress, Reporter};
pub use mirror::stats::human_size;
pub use mirror::{run_mirror, DeleteMode, MirrorOptions, Phase, Reconciler, RunReport, RunStatistics};
pub use shutdown::ShutdownToken;
