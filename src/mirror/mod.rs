//! Two-way reconciliation of a source tree into a destination tree.
//!
//! A run is a fixed sequence of phases (`Forward -> Reverse -> Prune -> Done`):
//! - Forward walks the source and copies files that are missing or changed in the destination.
//! - Reverse walks the destination and removes files (and stray symlinks) whose
//!   source counterpart is gone.
//! - Prune removes directories left empty below the destination root.
//!
//! Per-file failures are reported and counted, never fatal. Statistics are
//! folded by the driver from per-file outcomes, so parallel workers share no
//! counters.

pub mod classify;
pub mod operator;
pub mod path_map;
pub mod prune;
pub mod report;
pub mod stats;
pub mod walk;

use rayon::prelude::*;
use rayon::ThreadPool;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::errors::MirrorError;
use crate::fs_ops::CopyOptions;
use crate::shutdown::ShutdownToken;
use classify::{classify_forward, classify_reverse, classify_reverse_link, Disposition, FileRecord};
use operator::{FileOperator, OperationResult};
use report::{display_name, Progress, Reporter};
use walk::TreeListing;

pub use operator::DeleteMode;
pub use stats::RunStatistics;

/// Everything a run needs, already validated.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    /// Dry run: classify and report, never mutate.
    pub test_mode: bool,
    pub delete_mode: DeleteMode,
    pub copy: CopyOptions,
    /// Worker threads per pass; `1` runs sequentially.
    pub jobs: usize,
}

impl MirrorOptions {
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>, delete_mode: DeleteMode) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            test_mode: false,
            delete_mode,
            copy: CopyOptions::default(),
            jobs: 1,
        }
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Forward,
    Reverse,
    Prune,
    Done,
}

impl Phase {
    /// The phase that follows this one. `Done` is terminal.
    pub fn next(self) -> Phase {
        match self {
            Phase::Forward => Phase::Reverse,
            Phase::Reverse => Phase::Prune,
            Phase::Prune | Phase::Done => Phase::Done,
        }
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub stats: RunStatistics,
    /// Cancellation was requested; remaining work was skipped.
    pub interrupted: bool,
}

/// What happened to one walked file.
enum FileOutcome {
    Applied(Disposition, OperationResult),
    Unchanged,
    Failed,
    Cancelled,
}

/// Drives one run through its phases.
pub struct Reconciler<'r> {
    options: MirrorOptions,
    reporter: &'r dyn Reporter,
    cancel: ShutdownToken,
}

impl<'r> Reconciler<'r> {
    pub fn new(options: MirrorOptions, reporter: &'r dyn Reporter) -> Self {
        Self {
            options,
            reporter,
            cancel: ShutdownToken::new(),
        }
    }

    /// Observe `cancel` between files.
    pub fn with_cancel(mut self, cancel: ShutdownToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    pub fn run(&self) -> RunReport {
        let opts = &self.options;
        let operator = FileOperator::new(
            &opts.dest_root,
            opts.test_mode,
            opts.delete_mode.clone(),
            opts.copy,
            self.reporter,
        );
        let pool = self.build_pool();
        let mut stats = RunStatistics::default();
        let mut interrupted = false;
        let mut phase = Phase::Forward;

        while phase != Phase::Done {
            info!(?phase, source = %opts.source_root.display(), dest = %opts.dest_root.display(), test_mode = opts.test_mode, "phase start");
            match phase {
                Phase::Forward => {
                    self.reporter.report(Progress::Backup {
                        source: opts.source_root.clone(),
                        dest: opts.dest_root.clone(),
                        test_mode: opts.test_mode,
                    });
                    if let Err(e) = operator.ensure_dir(&opts.dest_root) {
                        // Every copy would fail the same way; let them report individually.
                        self.report_failure("create directory", &opts.dest_root, &e);
                        stats.record_failure();
                    }
                    let listing = walk::list_files(&opts.source_root);
                    interrupted = self.run_pass(pool.as_ref(), listing, &mut stats, |file| {
                        self.forward_one(&operator, file)
                    });
                }
                Phase::Reverse => {
                    self.reporter.report(Progress::ReverseScan {
                        source: opts.source_root.clone(),
                        dest: opts.dest_root.clone(),
                        test_mode: opts.test_mode,
                    });
                    let listing = walk::list_files_and_links(&opts.dest_root);
                    interrupted = self.run_pass(pool.as_ref(), listing, &mut stats, |file| {
                        self.reverse_one(&operator, file)
                    });
                }
                Phase::Prune => {
                    let pruned = prune::prune(&opts.dest_root, &operator, &self.cancel);
                    for _ in &pruned.pruned {
                        stats.record(Disposition::PruneEmptyDir, 0);
                    }
                    for issue in &pruned.issues {
                        self.report_failure("remove directory", &issue.path, &issue.error);
                        stats.record_failure();
                    }
                    interrupted = pruned.interrupted;
                }
                Phase::Done => {}
            }
            if interrupted {
                warn!(?phase, "run interrupted; skipping remaining work");
                break;
            }
            phase = phase.next();
        }

        info!(
            copied = stats.files_copied(),
            deleted = stats.files_deleted,
            pruned = stats.empty_dirs_removed,
            failures = stats.failures,
            interrupted,
            "run finished"
        );
        if stats.has_activity() {
            self.reporter.report(Progress::Summary(stats));
        }
        RunReport { stats, interrupted }
    }

    fn build_pool(&self) -> Option<ThreadPool> {
        if self.options.jobs <= 1 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .thread_name(|i| format!("mirror-worker-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, jobs = self.options.jobs, "cannot start worker pool; running sequentially");
                None
            }
        }
    }

    /// Apply `work` to every listed file and fold the outcomes into `stats`.
    /// Returns true when the pass was cancelled.
    fn run_pass<F>(
        &self,
        pool: Option<&ThreadPool>,
        listing: TreeListing,
        stats: &mut RunStatistics,
        work: F,
    ) -> bool
    where
        F: Fn(&FileRecord) -> FileOutcome + Sync,
    {
        for issue in &listing.issues {
            self.report_failure("read", &issue.path, &issue.error);
            stats.record_failure();
        }

        let outcomes: Vec<FileOutcome> = match pool {
            Some(pool) => pool.install(|| listing.files.par_iter().map(&work).collect()),
            None => {
                let mut out = Vec::with_capacity(listing.files.len());
                for file in &listing.files {
                    let outcome = work(file);
                    let stop = matches!(outcome, FileOutcome::Cancelled);
                    out.push(outcome);
                    if stop {
                        break;
                    }
                }
                out
            }
        };

        let mut cancelled = false;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Applied(disposition, OperationResult::Copied { bytes, displaced }) => {
                    stats.absorb(displaced);
                    stats.record(disposition, bytes);
                }
                FileOutcome::Applied(disposition, OperationResult::Deleted { bytes }) => {
                    stats.record(disposition, bytes)
                }
                FileOutcome::Applied(disposition, _) => stats.record(disposition, 0),
                FileOutcome::Unchanged => {}
                FileOutcome::Failed => stats.record_failure(),
                FileOutcome::Cancelled => cancelled = true,
            }
        }
        cancelled
    }

    fn forward_one(&self, operator: &FileOperator<'_>, source: &FileRecord) -> FileOutcome {
        if self.cancel.is_requested() {
            return FileOutcome::Cancelled;
        }
        let opts = &self.options;
        let dest = match path_map::map(&source.path, &opts.source_root, &opts.dest_root) {
            Ok(p) => p,
            Err(e) => return self.fail("map", &source.path, &e),
        };
        let existing = match FileRecord::probe(&dest) {
            Ok(r) => r,
            Err(e) => return self.fail("read", &dest, &e),
        };
        let disposition = classify_forward(source, existing.as_ref());
        debug!(path = %source.path.display(), %disposition, "classified");
        if disposition == Disposition::NoAction {
            return FileOutcome::Unchanged;
        }
        match operator.apply(disposition, source, &dest) {
            Ok(result) => FileOutcome::Applied(disposition, result),
            Err(e) => self.fail("copy", &source.path, &e),
        }
    }

    fn reverse_one(&self, operator: &FileOperator<'_>, walked: &FileRecord) -> FileOutcome {
        if self.cancel.is_requested() {
            return FileOutcome::Cancelled;
        }
        // Already removed while the forward pass cleared a path for a copy.
        if operator.is_removed(&walked.path) {
            return FileOutcome::Unchanged;
        }
        let opts = &self.options;
        let counterpart_path = match path_map::map(&walked.path, &opts.dest_root, &opts.source_root) {
            Ok(p) => p,
            Err(e) => return self.fail("map", &walked.path, &e),
        };
        let counterpart = match FileRecord::probe(&counterpart_path) {
            Ok(r) => r,
            Err(e) => return self.fail("read", &counterpart_path, &e),
        };
        let disposition = if walked.is_file {
            classify_reverse(counterpart.as_ref())
        } else {
            classify_reverse_link(counterpart.as_ref())
        };
        if disposition == Disposition::NoAction {
            return FileOutcome::Unchanged;
        }
        debug!(path = %walked.path.display(), %disposition, "classified");
        match operator.apply(disposition, walked, &counterpart_path) {
            Ok(result) => FileOutcome::Applied(disposition, result),
            Err(e) => self.fail("delete", &walked.path, &e),
        }
    }

    fn fail(&self, op: &'static str, path: &Path, err: &MirrorError) -> FileOutcome {
        self.report_failure(op, path, err);
        FileOutcome::Failed
    }

    fn report_failure(&self, op: &'static str, path: &Path, err: &MirrorError) {
        error!(op, path = %path.display(), kind = err.kind(), error = %err, "operation failed");
        self.reporter.report(Progress::Failed {
            op,
            name: display_name(path),
            cause: err.to_string(),
        });
    }
}

/// Run a full reconciliation with `options`, reporting to `reporter`.
pub fn run_mirror(options: MirrorOptions, reporter: &dyn Reporter, cancel: ShutdownToken) -> RunReport {
    Reconciler::new(options, reporter).with_cancel(cancel).run()
}
