//! Empty-directory pruning below the destination root.
//!
//! One bottom-up pass: children are visited before their parent, so a chain of
//! directories that only contained each other collapses in a single run.
//! "Empty" means zero directory entries, never zero reported size.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::operator::FileOperator;
use super::walk::WalkIssue;
use crate::errors::MirrorError;
use crate::fs_ops::helpers::mirror_io_error;
use crate::shutdown::ShutdownToken;

#[derive(Debug, Default)]
pub struct PruneReport {
    pub pruned: Vec<PathBuf>,
    pub issues: Vec<WalkIssue>,
    pub interrupted: bool,
}

/// Remove every directory strictly below `dest_root` that is (or becomes) empty.
/// The root itself is never removed.
pub fn prune(dest_root: &Path, operator: &FileOperator<'_>, cancel: &ShutdownToken) -> PruneReport {
    let mut report = PruneReport::default();
    let mut pruned: HashSet<PathBuf> = HashSet::new();

    let walker = WalkDir::new(dest_root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
        .sort_by_file_name();

    for item in walker {
        if cancel.is_requested() {
            report.interrupted = true;
            break;
        }
        let entry = match item {
            Ok(e) => e,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| dest_root.to_path_buf());
                let io_err = err.into_io_error().unwrap_or_else(|| io::Error::other("filesystem loop detected"));
                if path == dest_root && io_err.kind() == io::ErrorKind::NotFound {
                    return report;
                }
                warn!(path = %path.display(), error = %io_err, "cannot scan directory for pruning");
                let error = mirror_io_error("scan directory", &path)(io_err);
                report.issues.push(WalkIssue { path, error });
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        if operator.is_dir_removed(dir) {
            continue;
        }
        match is_effectively_empty(dir, &pruned, operator) {
            Ok(true) => match operator.remove_empty_dir(dir) {
                Ok(_) => {
                    debug!(dir = %dir.display(), "pruned empty directory");
                    pruned.insert(dir.to_path_buf());
                    report.pruned.push(dir.to_path_buf());
                }
                Err(error) => report.issues.push(WalkIssue { path: dir.to_path_buf(), error }),
            },
            Ok(false) => {}
            Err(error) => report.issues.push(WalkIssue { path: dir.to_path_buf(), error }),
        }
    }
    report
}

/// A directory is empty when every entry it still lists is gone for this run:
/// a subdirectory pruned earlier in the pass or, in test mode, a file the reverse
/// pass would have deleted. A directory about to receive a copied file never is.
fn is_effectively_empty(
    dir: &Path,
    pruned: &HashSet<PathBuf>,
    operator: &FileOperator<'_>,
) -> Result<bool, MirrorError> {
    if operator.is_populated(dir) {
        return Ok(false);
    }
    let entries = fs::read_dir(dir).map_err(mirror_io_error("read directory", dir))?;
    for entry in entries {
        let entry = entry.map_err(mirror_io_error("read directory entry", dir))?;
        let path = entry.path();
        if pruned.contains(&path) || operator.is_removed(&path) || operator.is_dir_removed(&path) {
            continue;
        }
        return Ok(false);
    }
    Ok(true)
}
