//! OS-specific file helpers used by configuration and logging.
//! Unix gets real permission bits; on Windows the mode helpers are no-ops.

#[cfg(unix)]
mod common_unix;
mod temp;
#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{open_log_file_secure_append, set_dir_mode_0700, set_file_mode_0600, write_config_secure_0600};

#[cfg(not(unix))]
pub use windows::{open_log_file_secure_append, set_dir_mode_0700, set_file_mode_0600, write_config_secure_0600};
