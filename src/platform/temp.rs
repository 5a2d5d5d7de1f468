//! Sibling temp names for atomic config writes.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQ: AtomicU64 = AtomicU64::new(0);

/// Hidden name next to `target`: `.mirror_backup.config.<pid>.<nanos>.<seq>.tmp`
pub(crate) fn config_temp_sibling(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!(".mirror_backup.config.{pid}.{nanos}.{seq}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn names_are_unique_across_threads() {
        let handles: Vec<_> = (0..16)
            .map(|_| thread::spawn(|| config_temp_sibling(Path::new("/cfg/config.xml"))))
            .collect();
        let names: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(names.len(), 16);
        assert!(names.iter().all(|p| p.parent() == Some(Path::new("/cfg"))));
    }
}
