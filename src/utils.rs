use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Return `candidate` if free, else a sibling named "<stem>-<millis>-<pid>[-n].<ext?>".
/// Non-UTF8 names are preserved.
pub(crate) fn unique_destination(candidate: &Path) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }

    let epoch_ms = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let pid = std::process::id();
    let stem = candidate
        .file_stem()
        .map(OsStr::to_owned)
        .unwrap_or_else(|| OsString::from("file"));
    let ext = candidate.extension().map(OsStr::to_owned);

    let build = |suffix: &str| {
        let mut name = stem.clone();
        name.push(format!("-{epoch_ms}-{pid}{suffix}"));
        if let Some(e) = &ext {
            name.push(".");
            name.push(e);
        }
        candidate.with_file_name(name)
    };

    let first = build("");
    if !first.exists() {
        return first;
    }
    (2u32..=64)
        .map(|n| build(&format!("-{n}")))
        .find(|p| !p.exists())
        .unwrap_or_else(|| build("-final"))
}
