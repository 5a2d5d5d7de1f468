//! Windows implementations. There are no POSIX modes; ACLs are left alone.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use super::temp::config_temp_sibling;

pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Temp file + rename. An existing config is removed first since rename won't replace it.
pub fn write_config_secure_0600(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("'{}' has no parent directory", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory '{}'", parent.display()))?;

    let tmp = config_temp_sibling(path);
    let mut f = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp)
        .with_context(|| format!("create temp file '{}'", tmp.display()))?;
    f.write_all(contents).and_then(|_| f.sync_all()).context("write temp config")?;
    drop(f);
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("replace '{}'", path.display()))?;
    }
    fs::rename(&tmp, path).with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()))?;
    Ok(())
}

pub fn set_dir_mode_0700(_path: &Path) -> io::Result<()> {
    Ok(())
}

pub fn set_file_mode_0600(_path: &Path) -> io::Result<()> {
    Ok(())
}
