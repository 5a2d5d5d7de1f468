//! File classification: decides what happens to one file.
//!
//! Pure functions over metadata snapshots. Forward rule precedence is
//! existence > size > time; the reverse rule only ever deletes.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::MirrorError;
use crate::fs_ops::helpers::mirror_io_error;

/// Metadata snapshot of one filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Length in bytes for regular files, 0 for anything else.
    pub size: u64,
    pub mtime: SystemTime,
    /// Regular file. Directories, symlinks and special files are not.
    pub is_file: bool,
}

impl FileRecord {
    pub fn from_metadata(path: impl Into<PathBuf>, meta: &fs::Metadata) -> Self {
        Self {
            path: path.into(),
            size: if meta.is_file() { meta.len() } else { 0 },
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            is_file: meta.file_type().is_file(),
        }
    }

    /// Snapshot `path` without following a final symlink.
    pub fn read(path: &Path) -> Result<Self, MirrorError> {
        let meta = fs::symlink_metadata(path).map_err(mirror_io_error("read metadata", path))?;
        Ok(Self::from_metadata(path, &meta))
    }

    /// Like `read`, but a missing entry is `Ok(None)`.
    pub fn probe(path: &Path) -> Result<Option<Self>, MirrorError> {
        match fs::symlink_metadata(path) {
            Ok(meta) => Ok(Some(Self::from_metadata(path, &meta))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // A file where a directory is expected ("a.txt/b") means the entry can't exist.
            Err(e) if is_not_a_directory(&e) => Ok(None),
            Err(e) => Err(mirror_io_error("read metadata", path)(e)),
        }
    }
}

fn is_not_a_directory(e: &io::Error) -> bool {
    #[cfg(unix)]
    {
        e.raw_os_error() == Some(libc::ENOTDIR)
    }
    #[cfg(not(unix))]
    {
        // ERROR_PATH_NOT_FOUND / ERROR_DIRECTORY
        matches!(e.raw_os_error(), Some(3) | Some(267))
    }
}

/// Why an existing destination file is being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeReason {
    SizeDiffers,
    NewerInSource,
}

/// Outcome of classifying one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    CopyMissing,
    CopyChanged(ChangeReason),
    NoAction,
    DeleteStale,
    PruneEmptyDir,
}

impl Disposition {
    pub fn is_copy(self) -> bool {
        matches!(self, Disposition::CopyMissing | Disposition::CopyChanged(_))
    }

    /// Human-readable reason shown in progress lines.
    pub fn reason(self) -> &'static str {
        match self {
            Disposition::CopyMissing => "file does not exist in destination",
            Disposition::CopyChanged(ChangeReason::SizeDiffers) => "file size has changed",
            Disposition::CopyChanged(ChangeReason::NewerInSource) => "file date has changed",
            Disposition::NoAction => "file is up to date",
            Disposition::DeleteStale => "file does not exist in source",
            Disposition::PruneEmptyDir => "directory is empty",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Forward pass: should `source` be copied over `dest`?
///
/// A destination entry that is not a regular file (directory, symlink) counts as missing.
/// Equal sizes with a destination as new or newer than the source is `NoAction`.
pub fn classify_forward(source: &FileRecord, dest: Option<&FileRecord>) -> Disposition {
    let Some(dest) = dest.filter(|d| d.is_file) else {
        return Disposition::CopyMissing;
    };
    if source.size != dest.size {
        return Disposition::CopyChanged(ChangeReason::SizeDiffers);
    }
    if source.mtime > dest.mtime {
        return Disposition::CopyChanged(ChangeReason::NewerInSource);
    }
    Disposition::NoAction
}

/// Reverse pass: is the walked destination file stale given its source counterpart?
pub fn classify_reverse(counterpart: Option<&FileRecord>) -> Disposition {
    match counterpart {
        Some(src) if src.is_file => Disposition::NoAction,
        _ => Disposition::DeleteStale,
    }
}

/// Reverse pass for a destination symlink: stale only when nothing at all exists
/// at the source path. Links are never followed.
pub fn classify_reverse_link(counterpart: Option<&FileRecord>) -> Disposition {
    match counterpart {
        Some(_) => Disposition::NoAction,
        None => Disposition::DeleteStale,
    }
}
