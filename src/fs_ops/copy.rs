//! Safe copy-and-rename:
//! - Checks free space in the destination directory
//! - Copies to a temp file next to the destination (fsynced)
//! - Stamps the source's times (and optionally permissions) onto the temp file
//! - Atomically renames temp -> dest, replacing any previous version
//!
//! A failure at any step removes the temp file, so the destination either keeps
//! its previous content or holds the complete new copy.

use std::fs;
use std::path::Path;

use super::atomic::replace_atomically;
use super::helpers::mirror_io_error;
use super::io_copy::{copy_streaming, DurabilityMode};
use super::{metadata, space, util};
use crate::errors::MirrorError;

/// Knobs for a single mirrored copy.
#[derive(Debug, Clone, Copy)]
pub struct CopyOptions {
    pub preserve_permissions: bool,
    pub durability: DurabilityMode,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            preserve_permissions: false,
            durability: DurabilityMode::Full,
        }
    }
}

/// Copy `src` over `dest` with content and modification time. Returns bytes written.
/// The destination's parent directory must already exist.
pub fn copy_with_metadata(src: &Path, dest: &Path, opts: CopyOptions) -> Result<u64, MirrorError> {
    let dest_dir = dest.parent().ok_or_else(|| MirrorError::Io {
        op: "resolve destination directory",
        path: dest.to_path_buf(),
        message: format!("destination has no parent: {}", dest.display()),
        source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
    })?;

    let src_meta = fs::metadata(src).map_err(mirror_io_error("read source metadata", src))?;
    space::ensure_space_for_copy(dest_dir, src_meta.len())?;

    let tmp = util::unique_temp_path(dest_dir);
    match stage_and_replace(src, &tmp, dest, &src_meta, opts) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn stage_and_replace(
    src: &Path,
    tmp: &Path,
    dest: &Path,
    src_meta: &fs::Metadata,
    opts: CopyOptions,
) -> Result<u64, MirrorError> {
    let bytes = copy_streaming(src, tmp, opts.durability)
        .map_err(mirror_io_error("copy to temporary file", tmp))?;
    if opts.preserve_permissions {
        metadata::apply_permissions(tmp, src_meta);
    }
    metadata::apply_times(tmp, src_meta)?;
    replace_atomically(tmp, dest)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::tempdir;

    #[test]
    fn copy_creates_file_with_same_mtime() {
        let td = tempdir().unwrap();
        let src = td.path().join("a.txt");
        fs::write(&src, b"hello").unwrap();
        let when = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, when).unwrap();

        let dest = td.path().join("b.txt");
        let n = copy_with_metadata(&src, &dest, CopyOptions::default()).unwrap();
        assert_eq!(n, 5);
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
        let got = FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(got, when);
    }

    #[test]
    fn copy_replaces_existing_and_leaves_no_temp() {
        let td = tempdir().unwrap();
        let src = td.path().join("src").join("a.txt");
        let out = td.path().join("out");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(&src, b"new content").unwrap();
        let dest = out.join("a.txt");
        fs::write(&dest, b"old").unwrap();

        copy_with_metadata(&src, &dest, CopyOptions::default()).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new content");
        let names: Vec<_> = fs::read_dir(&out).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names.len(), 1, "temp file left behind: {names:?}");
    }

    #[test]
    fn missing_source_reports_io_error() {
        let td = tempdir().unwrap();
        let err = copy_with_metadata(
            &td.path().join("nope"),
            &td.path().join("dst"),
            CopyOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "io");
        assert!(!td.path().join("dst").exists());
    }
}
