//! Atomic replace helper.
//! - Renames a finished temp file over the destination.
//! - On Windows, removes an existing destination first (RenameFile doesn't overwrite).
//! - On Unix, best-effort fsync of the destination directory after rename.

use std::fs;
use std::path::Path;

use super::helpers::mirror_io_error;
use crate::errors::MirrorError;

pub(super) fn replace_atomically(tmp: &Path, dst: &Path) -> Result<(), MirrorError> {
    #[cfg(windows)]
    {
        if dst.exists() {
            if let Err(e) = fs::remove_file(dst) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(mirror_io_error("remove existing destination", dst)(e));
                }
            }
        }
    }

    fs::rename(tmp, dst).map_err(mirror_io_error("rename temporary file into place", dst))?;

    // A failed directory fsync must not turn a completed rename into a failure.
    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        let _ = super::util::fsync_dir(parent);
    }

    Ok(())
}
