//! Metadata preservation for mirrored files.
//! - Modification time is part of the mirror contract, so failing to set it is an error.
//! - Access time follows along when available.
//! - Permissions are optional and best-effort (logged, never fatal).

use filetime::{set_file_times, FileTime};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

use super::helpers::mirror_io_error;
use crate::errors::MirrorError;

/// Copy atime/mtime from `src_meta` onto `dest`.
pub fn apply_times(dest: &Path, src_meta: &fs::Metadata) -> Result<(), MirrorError> {
    let mtime = FileTime::from_last_modification_time(src_meta);
    let atime = FileTime::from_last_access_time(src_meta);
    set_file_times(dest, atime, mtime).map_err(mirror_io_error("set modification time", dest))?;
    trace!(path = %dest.display(), "set atime/mtime on destination");
    Ok(())
}

/// Mirror permission bits (Unix mode, Windows readonly flag).
pub fn apply_permissions(dest: &Path, src_meta: &fs::Metadata) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = src_meta.permissions().mode() & 0o7777;
        if let Err(e) = fs::set_permissions(dest, fs::Permissions::from_mode(mode)) {
            warn!(path = %dest.display(), mode = format!("{:o}", mode), error = %e, "failed to set permissions on destination");
        } else {
            trace!(path = %dest.display(), mode = format!("{:o}", mode), "set permissions on destination");
        }
    }

    #[cfg(windows)]
    {
        let ro = src_meta.permissions().readonly();
        match fs::metadata(dest) {
            Ok(meta) => {
                let mut perms = meta.permissions();
                perms.set_readonly(ro);
                if let Err(e) = fs::set_permissions(dest, perms) {
                    warn!(path = %dest.display(), readonly = ro, error = %e, "failed to set readonly attribute on destination");
                }
            }
            Err(e) => {
                warn!(path = %dest.display(), error = %e, "failed to stat destination for readonly preservation");
            }
        }
    }
}
