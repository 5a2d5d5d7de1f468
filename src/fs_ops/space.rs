//! Free-space probe run before each copy.

use std::io;
use std::path::Path;
use tracing::debug;

#[cfg(unix)]
use std::os::unix::ffi::OsStrExt;
#[cfg(windows)]
use std::os::windows::ffi::OsStrExt;

use crate::errors::MirrorError;

/// Headroom kept free on the destination volume.
const CUSHION: u64 = 4 * 1024 * 1024;

/// Fail with `InsufficientSpace` when `dst_dir` can't hold `required` bytes.
/// An unanswerable probe (unsupported filesystem, odd mount) never blocks the copy.
pub(super) fn ensure_space_for_copy(dst_dir: &Path, required: u64) -> Result<(), MirrorError> {
    let free = match free_space_bytes(dst_dir) {
        Ok(n) => n,
        Err(e) => {
            debug!(dir = %dst_dir.display(), error = %e, "free-space probe failed; skipping check");
            return Ok(());
        }
    };
    if free < required.saturating_add(CUSHION) {
        return Err(MirrorError::InsufficientSpace {
            required,
            available: free,
            dest: dst_dir.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(unix)]
pub(super) fn free_space_bytes(path: &Path) -> io::Result<u64> {
    // SAFETY: statvfs is plain old data; zeroed is a valid initial value.
    let mut s: libc::statvfs = unsafe { std::mem::zeroed() };
    let cpath = std::ffi::CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;
    // SAFETY: cpath is NUL-terminated and `s` is a valid out-pointer.
    let rc = unsafe { libc::statvfs(cpath.as_ptr(), &mut s) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    #[allow(clippy::unnecessary_cast)]
    Ok((s.f_bavail as u64).saturating_mul(s.f_frsize as u64))
}

#[cfg(windows)]
pub(super) fn free_space_bytes(path: &Path) -> io::Result<u64> {
    use std::iter::once;
    use windows_sys::Win32::Storage::FileSystem::GetDiskFreeSpaceExW;
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(once(0)).collect();
    let mut free_avail: u64 = 0;
    let mut total: u64 = 0;
    let mut total_free: u64 = 0;
    // SAFETY: `wide` is NUL-terminated and the out-pointers live on this stack frame.
    let ok = unsafe { GetDiskFreeSpaceExW(wide.as_ptr(), &mut free_avail, &mut total, &mut total_free) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(free_avail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn small_copy_fits() {
        let td = tempdir().unwrap();
        ensure_space_for_copy(td.path(), 16).unwrap();
    }

    #[test]
    fn absurd_copy_is_refused() {
        let td = tempdir().unwrap();
        let err = ensure_space_for_copy(td.path(), u64::MAX - 1).unwrap_err();
        assert!(matches!(err, MirrorError::InsufficientSpace { .. }));
    }
}
