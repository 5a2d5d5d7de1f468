//! Streaming copy into a freshly created file.
//!
//! - The destination is opened with `create_new`, so an existing file is never clobbered
//!   (callers always copy into a unique temp name).
//! - Buffered I/O with 1 MiB buffers; on Linux `copy_file_range` is tried first.
//! - `DurabilityMode::Full` fsyncs the written file before returning.
//!
//! Snapshot semantics: the source is read once from start to EOF. Growth during the
//! copy is not included; callers compare `bytes` against the length they classified.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

const BUF_SIZE: usize = 1024 * 1024;

/// Post-write flush behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurabilityMode {
    /// Flush to the OS page cache only.
    Data,
    /// Force data and metadata to stable storage (`sync_all`).
    Full,
}

/// Stream `src` into a new file at `dst`. Returns the number of bytes written.
pub(super) fn copy_streaming(src: &Path, dst: &Path, mode: DurabilityMode) -> io::Result<u64> {
    let src_f = File::open(src)?;
    let dst_f = OpenOptions::new().write(true).create_new(true).open(dst)?;

    #[cfg(target_os = "linux")]
    {
        if let Some(bytes) = kernel_copy(&src_f, &dst_f)? {
            if mode == DurabilityMode::Full {
                dst_f.sync_all()?;
            }
            return Ok(bytes);
        }
    }

    let mut reader = BufReader::with_capacity(BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    if mode == DurabilityMode::Full {
        writer.get_ref().sync_all()?;
    }
    Ok(bytes)
}

/// In-kernel copy. Returns Ok(None) when the filesystem pair doesn't support it
/// and nothing has been written yet, so the caller can fall back to streaming.
#[cfg(target_os = "linux")]
fn kernel_copy(src: &File, dst: &File) -> io::Result<Option<u64>> {
    use std::os::unix::io::AsRawFd;

    const CHUNK: usize = 16 * 1024 * 1024;
    let mut total: u64 = 0;
    loop {
        // SAFETY: both descriptors are open for the duration of the call and
        // null offsets make the kernel use (and advance) the file positions.
        let rc = unsafe {
            libc::copy_file_range(
                src.as_raw_fd(),
                std::ptr::null_mut(),
                dst.as_raw_fd(),
                std::ptr::null_mut(),
                CHUNK,
                0,
            )
        };
        if rc > 0 {
            total += rc as u64;
            continue;
        }
        if rc == 0 {
            return Ok(Some(total));
        }
        let err = io::Error::last_os_error();
        let unsupported = matches!(
            err.raw_os_error(),
            Some(libc::EXDEV) | Some(libc::ENOSYS) | Some(libc::EINVAL) | Some(libc::EPERM)
        );
        if total == 0 && unsupported {
            return Ok(None);
        }
        return Err(err);
    }
}
