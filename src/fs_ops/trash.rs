//! Recoverable holding area for deleted entries.
//!
//! Layout: `<trash base>/<run stamp>/<path relative to the destination root>`.
//! Each run gets its own stamp directory, created lazily on the first stash.
//! Files are renamed in; across filesystems they are copied (with metadata)
//! and the original removed.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::copy::{copy_with_metadata, CopyOptions};
use super::helpers::mirror_io_error;
use super::io_copy::DurabilityMode;
use super::util::is_cross_device;
use crate::errors::MirrorError;
use crate::utils::unique_destination;

#[derive(Debug, Clone)]
pub struct Trash {
    run_dir: PathBuf,
}

impl Trash {
    pub fn new(base: &Path, stamp: &str) -> Self {
        Self {
            run_dir: base.join(stamp),
        }
    }

    /// Directory that receives this run's entries.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Move the file (or symlink) at `path` into the holding area under `rel`.
    pub fn stash_file(&self, path: &Path, rel: &Path) -> Result<PathBuf, MirrorError> {
        let target = unique_destination(&self.run_dir.join(rel));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(mirror_io_error("create trash directory", parent))?;
        }

        match fs::rename(path, &target) {
            Ok(()) => {}
            Err(e) if is_cross_device(&e) => {
                debug!(src = %path.display(), dest = %target.display(), "trash on another filesystem; copying");
                let is_link = fs::symlink_metadata(path)
                    .map(|m| m.file_type().is_symlink())
                    .map_err(mirror_io_error("read metadata", path))?;
                if is_link {
                    relink(path, &target)?;
                } else {
                    let opts = CopyOptions {
                        preserve_permissions: true,
                        durability: DurabilityMode::Data,
                    };
                    copy_with_metadata(path, &target, opts)?;
                }
                fs::remove_file(path).map_err(mirror_io_error("remove file after trashing", path))?;
            }
            Err(e) => return Err(mirror_io_error("move file to trash", path)(e)),
        }
        Ok(target)
    }

    /// Record an empty directory in the holding area, then remove the original.
    pub fn stash_empty_dir(&self, path: &Path, rel: &Path) -> Result<PathBuf, MirrorError> {
        let target = self.run_dir.join(rel);
        fs::create_dir_all(&target).map_err(mirror_io_error("create trash directory", &target))?;
        fs::remove_dir(path).map_err(mirror_io_error("remove empty directory", path))?;
        Ok(target)
    }
}

/// Recreate the symlink at `path` as `target`, pointing at the same place.
#[cfg(unix)]
fn relink(path: &Path, target: &Path) -> Result<(), MirrorError> {
    let points_to = fs::read_link(path).map_err(mirror_io_error("read symlink", path))?;
    std::os::unix::fs::symlink(&points_to, target).map_err(mirror_io_error("create symlink in trash", target))
}

#[cfg(not(unix))]
fn relink(path: &Path, _target: &Path) -> Result<(), MirrorError> {
    Err(mirror_io_error("move symlink to trash", path)(std::io::Error::from(
        std::io::ErrorKind::Unsupported,
    )))
}
