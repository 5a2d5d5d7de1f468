#![allow(dead_code)]

use filetime::{set_file_mtime, FileTime};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use mirror_backup::{
    run_mirror, DeleteMode, MemoryReporter, MirrorOptions, RunReport, ShutdownToken,
};

/// Source and destination roots inside one temp dir (canonical, so symlinked
/// temp locations don't confuse path comparisons).
pub struct Roots {
    _td: tempfile::TempDir,
    pub base: PathBuf,
    pub src: PathBuf,
    pub dst: PathBuf,
}

pub fn roots() -> Roots {
    let td = tempfile::tempdir().unwrap();
    let base = dunce::canonicalize(td.path()).unwrap();
    let src = base.join("src");
    let dst = base.join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dst).unwrap();
    Roots { _td: td, base, src, dst }
}

pub fn write(root: &Path, rel: &str, contents: &[u8]) -> PathBuf {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(&p, contents).unwrap();
    p
}

pub fn set_mtime(path: &Path, unix_secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
}

/// What a tree looks like: every entry by relative path, files with
/// (contents, mtime), directories with `None`.
pub type Snapshot = BTreeMap<PathBuf, Option<(Vec<u8>, i64)>>;

pub fn snapshot(root: &Path) -> Snapshot {
    let mut out = BTreeMap::new();
    if !root.exists() {
        return out;
    }
    for e in WalkDir::new(root).min_depth(1) {
        let e = e.unwrap();
        let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
        if e.file_type().is_dir() {
            out.insert(rel, None);
        } else {
            let meta = e.metadata().unwrap();
            let mtime = FileTime::from_last_modification_time(&meta).unix_seconds();
            out.insert(rel, Some((fs::read(e.path()).unwrap(), mtime)));
        }
    }
    out
}

/// Only the files of a snapshot.
pub fn files(snap: &Snapshot) -> BTreeMap<PathBuf, (Vec<u8>, i64)> {
    snap.iter()
        .filter_map(|(k, v)| v.clone().map(|v| (k.clone(), v)))
        .collect()
}

pub fn options(r: &Roots) -> MirrorOptions {
    MirrorOptions::new(&r.src, &r.dst, DeleteMode::Zap)
}

pub fn run(opts: MirrorOptions) -> (RunReport, Vec<String>) {
    let rep = MemoryReporter::new();
    let report = run_mirror(opts, &rep, ShutdownToken::new());
    (report, rep.lines())
}
