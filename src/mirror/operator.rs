//! Applies dispositions to the filesystem.
//!
//! Every mutation happens here, and every mutation is skipped in test mode.
//! In test mode a small overlay remembers what a real run would have changed
//! (directories created, files written, entries deleted) so progress lines,
//! statistics and pruning come out exactly as they would for real.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use walkdir::WalkDir;

use super::classify::{Disposition, FileRecord};
use super::path_map;
use super::report::{display_name, Progress, Reporter};
use super::stats::RunStatistics;
use crate::errors::MirrorError;
use crate::fs_ops::helpers::mirror_io_error;
use crate::fs_ops::{copy_with_metadata, CopyOptions, Trash};

/// What happens to entries removed from the destination.
#[derive(Debug, Clone)]
pub enum DeleteMode {
    /// Permanent removal.
    Zap,
    /// Move into a recoverable holding area.
    Trash(Trash),
}

/// Confirmed (or, in test mode, simulated) result of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// `displaced` counts destination entries removed because they occupied
    /// the path the copy needed.
    Copied { bytes: u64, displaced: RunStatistics },
    Deleted { bytes: u64 },
    Pruned,
    Skipped,
}

#[derive(Debug, Default)]
struct Overlay {
    created_dirs: HashSet<PathBuf>,
    populated_dirs: HashSet<PathBuf>,
    removed_files: HashSet<PathBuf>,
    removed_dirs: HashSet<PathBuf>,
}

impl Overlay {
    fn is_gone(&self, path: &Path) -> bool {
        self.removed_files.contains(path) || self.removed_dirs.contains(path)
    }
}

pub struct FileOperator<'r> {
    dest_root: PathBuf,
    test_mode: bool,
    delete_mode: DeleteMode,
    copy_opts: CopyOptions,
    reporter: &'r dyn Reporter,
    overlay: Mutex<Overlay>,
}

impl<'r> FileOperator<'r> {
    pub fn new(
        dest_root: impl Into<PathBuf>,
        test_mode: bool,
        delete_mode: DeleteMode,
        copy_opts: CopyOptions,
        reporter: &'r dyn Reporter,
    ) -> Self {
        Self {
            dest_root: dest_root.into(),
            test_mode,
            delete_mode,
            copy_opts,
            reporter,
            overlay: Mutex::new(Overlay::default()),
        }
    }

    fn overlay(&self) -> MutexGuard<'_, Overlay> {
        self.overlay.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute `disposition` for `walked`.
    ///
    /// Copy dispositions copy `walked` onto `other`; `DeleteStale` removes `walked`
    /// itself (always an entry under the destination root).
    pub fn apply(
        &self,
        disposition: Disposition,
        walked: &FileRecord,
        other: &Path,
    ) -> Result<OperationResult, MirrorError> {
        match disposition {
            Disposition::CopyMissing | Disposition::CopyChanged(_) => self.copy(disposition, walked, other),
            Disposition::DeleteStale => self.delete_stale(walked),
            Disposition::PruneEmptyDir => self.remove_empty_dir(&walked.path),
            Disposition::NoAction => Ok(OperationResult::Skipped),
        }
    }

    fn copy(
        &self,
        disposition: Disposition,
        source: &FileRecord,
        dest: &Path,
    ) -> Result<OperationResult, MirrorError> {
        let displaced = self.clear_way(dest)?;
        self.reporter.report(Progress::Copying {
            disposition,
            name: display_name(&source.path),
        });

        if self.test_mode {
            self.note_populated(dest);
        } else {
            let written = copy_with_metadata(&source.path, dest, self.copy_opts)?;
            if written != source.size {
                debug!(path = %source.path.display(), classified = source.size, written, "source size changed during copy");
            }
        }
        Ok(OperationResult::Copied {
            bytes: source.size,
            displaced,
        })
    }

    /// Make room for a file at `dest`.
    ///
    /// A non-directory standing where one of its parent directories belongs is
    /// removed, missing parents are created, and a directory tree occupying
    /// `dest` itself is removed. Removals follow the delete mode and are counted.
    fn clear_way(&self, dest: &Path) -> Result<RunStatistics, MirrorError> {
        // Held throughout so two workers never race on the same directory.
        let mut overlay = self.overlay();
        let mut displaced = RunStatistics::default();
        if let Some(parent) = dest.parent() {
            self.displace_blocking_ancestor(&mut overlay, parent, &mut displaced)?;
            self.ensure_dir_locked(&mut overlay, parent)?;
        }
        if self.is_dir_now(&overlay, dest) {
            self.displace_tree(&mut overlay, dest, &mut displaced)?;
        }
        Ok(displaced)
    }

    /// Directories strictly below the destination root down to `dir`, outermost first.
    fn chain_below_root<'p>(&self, dir: &'p Path) -> Vec<&'p Path> {
        let mut chain: Vec<&Path> = dir
            .ancestors()
            .take_while(|a| *a != self.dest_root && a.starts_with(&self.dest_root))
            .collect();
        chain.reverse();
        chain
    }

    fn is_dir_now(&self, overlay: &Overlay, path: &Path) -> bool {
        if overlay.is_gone(path) {
            return false;
        }
        overlay.created_dirs.contains(path)
            || fs::symlink_metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    }

    fn displace_blocking_ancestor(
        &self,
        overlay: &mut Overlay,
        parent: &Path,
        displaced: &mut RunStatistics,
    ) -> Result<(), MirrorError> {
        for dir in self.chain_below_root(parent) {
            if overlay.created_dirs.contains(dir) {
                continue;
            }
            if overlay.is_gone(dir) {
                break;
            }
            match fs::symlink_metadata(dir) {
                Ok(meta) if meta.is_dir() => continue,
                Ok(meta) => {
                    debug!(path = %dir.display(), "non-directory in the way of a copy");
                    let record = FileRecord::from_metadata(dir, &meta);
                    let bytes = self.discard_file(&record)?;
                    if self.test_mode {
                        overlay.removed_files.insert(dir.to_path_buf());
                    }
                    displaced.record(Disposition::DeleteStale, bytes);
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => break,
                Err(e) => return Err(mirror_io_error("read metadata", dir)(e)),
            }
        }
        Ok(())
    }

    /// Remove the directory tree at `dir`, files first, then directories bottom-up.
    fn displace_tree(
        &self,
        overlay: &mut Overlay,
        dir: &Path,
        displaced: &mut RunStatistics,
    ) -> Result<(), MirrorError> {
        debug!(path = %dir.display(), "directory in the way of a copy");
        let walker = WalkDir::new(dir)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name();
        for item in walker {
            let entry = item.map_err(|err| {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                let io_err = err.into_io_error().unwrap_or_else(|| io::Error::other("filesystem loop detected"));
                mirror_io_error("scan directory", &path)(io_err)
            })?;
            let path = entry.path();
            if overlay.is_gone(path) {
                continue;
            }
            if entry.file_type().is_dir() {
                self.discard_dir(path)?;
                if self.test_mode {
                    overlay.removed_dirs.insert(path.to_path_buf());
                }
                displaced.record(Disposition::PruneEmptyDir, 0);
            } else {
                let meta = entry.metadata().map_err(|err| {
                    let io_err = err.into_io_error().unwrap_or_else(|| io::Error::other("metadata unavailable"));
                    mirror_io_error("read metadata", path)(io_err)
                })?;
                let bytes = self.discard_file(&FileRecord::from_metadata(path, &meta))?;
                if self.test_mode {
                    overlay.removed_files.insert(path.to_path_buf());
                }
                displaced.record(Disposition::DeleteStale, bytes);
            }
        }
        Ok(())
    }

    /// Create `dir` (and missing ancestors) unless it exists or was already created
    /// this run, announcing it the first time.
    pub fn ensure_dir(&self, dir: &Path) -> Result<(), MirrorError> {
        let mut overlay = self.overlay();
        self.ensure_dir_locked(&mut overlay, dir)
    }

    fn ensure_dir_locked(&self, overlay: &mut Overlay, dir: &Path) -> Result<(), MirrorError> {
        if overlay.created_dirs.contains(dir) || (!overlay.is_gone(dir) && dir.is_dir()) {
            return Ok(());
        }
        self.reporter.report(Progress::CreatedDir(dir.to_path_buf()));
        if !self.test_mode {
            fs::create_dir_all(dir).map_err(mirror_io_error("create directory", dir))?;
        }
        overlay.created_dirs.insert(dir.to_path_buf());
        Ok(())
    }

    fn note_populated(&self, dest: &Path) {
        let mut overlay = self.overlay();
        for dir in dest.ancestors().skip(1) {
            if dir == self.dest_root || !dir.starts_with(&self.dest_root) {
                break;
            }
            if !overlay.populated_dirs.insert(dir.to_path_buf()) {
                break;
            }
        }
    }

    /// Relative path of `path` inside the destination, refusing the root itself and
    /// anything outside it.
    fn inside_destination<'p>(&self, path: &'p Path) -> Result<&'p Path, MirrorError> {
        match path_map::relative(path, &self.dest_root) {
            Ok(rel) if !rel.as_os_str().is_empty() => Ok(rel),
            _ => Err(MirrorError::RefusedOutsideDestination {
                path: path.to_path_buf(),
                root: self.dest_root.clone(),
            }),
        }
    }

    fn delete_stale(&self, entry: &FileRecord) -> Result<OperationResult, MirrorError> {
        let bytes = self.discard_file(entry)?;
        if self.test_mode {
            self.overlay().removed_files.insert(entry.path.clone());
        }
        Ok(OperationResult::Deleted { bytes })
    }

    /// Report and (outside test mode) remove one non-directory entry: a file or a
    /// symlink, which is never followed. Returns the bytes counted for it.
    fn discard_file(&self, entry: &FileRecord) -> Result<u64, MirrorError> {
        let rel = self.inside_destination(&entry.path)?;
        self.reporter.report(Progress::Deleting {
            disposition: Disposition::DeleteStale,
            name: display_name(&entry.path),
        });
        if !self.test_mode {
            match &self.delete_mode {
                DeleteMode::Zap => {
                    fs::remove_file(&entry.path).map_err(mirror_io_error("delete file", &entry.path))?;
                }
                DeleteMode::Trash(trash) => {
                    let kept = trash.stash_file(&entry.path, rel)?;
                    debug!(path = %entry.path.display(), trash = %kept.display(), "moved to trash");
                }
            }
        }
        Ok(entry.size)
    }

    /// Remove a directory already judged empty.
    pub fn remove_empty_dir(&self, dir: &Path) -> Result<OperationResult, MirrorError> {
        self.discard_dir(dir)?;
        if self.test_mode {
            self.overlay().removed_dirs.insert(dir.to_path_buf());
        }
        Ok(OperationResult::Pruned)
    }

    fn discard_dir(&self, dir: &Path) -> Result<(), MirrorError> {
        let rel = self.inside_destination(dir)?;
        self.reporter.report(Progress::RemovingEmptyDir(dir.to_path_buf()));
        if !self.test_mode {
            match &self.delete_mode {
                DeleteMode::Zap => {
                    fs::remove_dir(dir).map_err(mirror_io_error("remove empty directory", dir))?;
                }
                DeleteMode::Trash(trash) => {
                    trash.stash_empty_dir(dir, rel)?;
                }
            }
        }
        Ok(())
    }

    /// Test mode: has this run already deleted the entry at `path`?
    pub fn is_removed(&self, path: &Path) -> bool {
        self.test_mode && self.overlay().removed_files.contains(path)
    }

    /// Test mode: has this run already removed the directory at `path`?
    pub fn is_dir_removed(&self, path: &Path) -> bool {
        self.test_mode && self.overlay().removed_dirs.contains(path)
    }

    /// Test mode: would a copied file have landed somewhere below `dir`?
    pub fn is_populated(&self, dir: &Path) -> bool {
        self.test_mode && self.overlay().populated_dirs.contains(dir)
    }
}
