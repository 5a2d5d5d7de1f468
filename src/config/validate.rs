//! Config validation: turns merged settings into run options.
//! Roots are made absolute and normalized, must be distinct and disjoint, and
//! the trash location must live outside both of them.

use chrono::Local;
use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use super::paths::default_trash_dir;
use super::types::Config;
use super::MAX_JOBS;
use crate::errors::MirrorError;
use crate::fs_ops::{CopyOptions, Trash};
use crate::mirror::{DeleteMode, MirrorOptions};

/// Per-run trash subdirectory name, local time.
pub fn run_stamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Check every precondition and build the options for one run.
///
/// Nothing is created here; a missing destination is created by the run itself.
pub fn validate(cfg: &Config, stamp: &str) -> Result<MirrorOptions, MirrorError> {
    let source = cfg.source.as_deref().ok_or(MirrorError::NoSource)?;
    let destination = cfg.destination.as_deref().ok_or(MirrorError::NoDestination)?;

    // Equal roots are reported before either is checked for existence.
    if let (Some(src), Some(dst)) = (comparable(source), comparable(destination)) {
        if src == dst {
            return Err(MirrorError::SameRoots(src));
        }
    }

    let source_root = match dunce::canonicalize(source) {
        Ok(p) if p.is_dir() => p,
        _ => return Err(MirrorError::SourceNotFound(source.to_path_buf())),
    };

    let dest_root = resolve(destination).map_err(|reason| MirrorError::DestinationUnusable {
        path: destination.to_path_buf(),
        reason,
    })?;
    if dest_root.exists() && !dest_root.is_dir() {
        return Err(MirrorError::DestinationUnusable {
            path: dest_root,
            reason: "not a directory".into(),
        });
    }

    if source_root == dest_root {
        return Err(MirrorError::SameRoots(source_root));
    }
    if dest_root.starts_with(&source_root) {
        return Err(MirrorError::NestedRoots { inner: dest_root, outer: source_root });
    }
    if source_root.starts_with(&dest_root) {
        return Err(MirrorError::NestedRoots { inner: source_root, outer: dest_root });
    }

    let delete_mode = if cfg.zap {
        DeleteMode::Zap
    } else {
        let base = trash_base(cfg, &source_root, &dest_root)?;
        debug!(trash = %base.display(), "deleted files will be kept");
        DeleteMode::Trash(Trash::new(&base, stamp))
    };

    let jobs = cfg.jobs.clamp(1, MAX_JOBS);
    let options = MirrorOptions {
        source_root,
        dest_root,
        test_mode: cfg.test_mode,
        delete_mode,
        copy: CopyOptions {
            preserve_permissions: cfg.preserve_permissions,
            ..CopyOptions::default()
        },
        jobs,
    };
    info!(
        source = %options.source_root.display(),
        dest = %options.dest_root.display(),
        test_mode = options.test_mode,
        zap = cfg.zap,
        jobs,
        "config validated"
    );
    Ok(options)
}

fn trash_base(cfg: &Config, source_root: &Path, dest_root: &Path) -> Result<PathBuf, MirrorError> {
    let requested = match cfg.trash_dir.clone().or_else(default_trash_dir) {
        Some(p) => p,
        None => {
            return Err(MirrorError::InvalidTrash {
                path: PathBuf::new(),
                reason: "no data directory available; set trash_dir or use --zap".into(),
            });
        }
    };
    let invalid = |path: PathBuf, reason: &str| MirrorError::InvalidTrash { path, reason: reason.into() };

    let base = resolve(&requested).map_err(|reason| MirrorError::InvalidTrash {
        path: requested.clone(),
        reason,
    })?;
    if base.exists() && !base.is_dir() {
        return Err(invalid(base, "not a directory"));
    }
    if base.starts_with(source_root) {
        return Err(invalid(base, "inside the source directory"));
    }
    if base.starts_with(dest_root) {
        return Err(invalid(base, "inside the destination directory"));
    }
    if source_root.starts_with(&base) || dest_root.starts_with(&base) {
        return Err(invalid(base, "contains the source or destination directory"));
    }
    Ok(base)
}

/// Absolute, normalized form of a path that may not exist yet: the deepest
/// existing ancestor is canonicalized (resolving symlinks) and the missing tail
/// re-attached.
fn resolve(path: &Path) -> Result<PathBuf, String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|e| format!("cannot determine current directory: {e}"))?
            .join(path)
    };
    let normalized = lexical_normalize(&absolute);

    let mut tail: Vec<&std::ffi::OsStr> = Vec::new();
    let mut cursor = normalized.as_path();
    loop {
        match dunce::canonicalize(cursor) {
            Ok(real) => {
                if !tail.is_empty() && !real.is_dir() {
                    return Err(format!("{} is not a directory", real.display()));
                }
                let mut out = real;
                out.extend(tail.iter().rev());
                return Ok(out);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (cursor.parent(), cursor.file_name()) else {
                    return Err("no existing ancestor (is the drive mounted?)".into());
                };
                tail.push(name);
                cursor = parent;
            }
            Err(e) => return Err(format!("cannot resolve {}: {e}", cursor.display())),
        }
    }
}

/// Best-effort normalized form used to compare roots that may not exist.
fn comparable(path: &Path) -> Option<PathBuf> {
    resolve(path).ok().or_else(|| {
        let cwd = env::current_dir().ok()?;
        Some(lexical_normalize(&cwd.join(path)))
    })
}

/// Drop `.` and fold `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn cfg(src: &Path, dst: &Path) -> Config {
        Config {
            zap: true,
            ..Config::new(src, dst)
        }
    }

    #[test]
    fn missing_roots_have_their_own_codes() {
        let td = tempdir().unwrap();
        let mut c = Config::default();
        assert_eq!(validate(&c, "s").unwrap_err().code(), 1);
        c.source = Some(td.path().to_path_buf());
        assert_eq!(validate(&c, "s").unwrap_err().code(), 2);
    }

    #[test]
    fn equal_roots_are_reported_before_a_missing_source() {
        let td = tempdir().unwrap();
        let ghost = td.path().join("ghost");
        let err = validate(&cfg(&ghost, &ghost.join("sub/..")), "s").unwrap_err();
        assert_eq!(err.code(), 3);
        let err = validate(&cfg(&ghost, &td.path().join("other")), "s").unwrap_err();
        assert_eq!(err.code(), 4);
    }

    #[test]
    fn same_and_nested_roots_are_rejected() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        fs::create_dir_all(a.join("inner")).unwrap();

        let same = validate(&cfg(&a, &a.join("inner/..")), "s").unwrap_err();
        assert!(matches!(same, MirrorError::SameRoots(_)));
        let nested = validate(&cfg(&a, &a.join("inner/new")), "s").unwrap_err();
        assert!(matches!(nested, MirrorError::NestedRoots { .. }));
        let outer = validate(&cfg(&a.join("inner"), &a), "s").unwrap_err();
        assert_eq!(outer.code(), 5);
    }

    #[test]
    fn sibling_with_shared_prefix_is_not_nested() {
        let td = tempdir().unwrap();
        let a = td.path().join("data");
        fs::create_dir_all(&a).unwrap();
        let opts = validate(&cfg(&a, &td.path().join("data-backup")), "s").unwrap();
        assert!(opts.dest_root.ends_with("data-backup"));
        assert!(!opts.dest_root.exists(), "validation never creates the destination");
    }

    #[test]
    fn source_must_be_an_existing_directory() {
        let td = tempdir().unwrap();
        let file = td.path().join("f");
        fs::write(&file, b"x").unwrap();
        assert_eq!(validate(&cfg(&td.path().join("nope"), &td.path().join("d")), "s").unwrap_err().code(), 4);
        assert_eq!(validate(&cfg(&file, &td.path().join("d")), "s").unwrap_err().code(), 4);
    }

    #[test]
    fn destination_file_or_file_ancestor_is_unusable() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let file = td.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert_eq!(validate(&cfg(&src, &file), "s").unwrap_err().code(), 6);
        assert_eq!(validate(&cfg(&src, &file.join("below")), "s").unwrap_err().code(), 6);
    }

    #[test]
    fn trash_inside_a_root_is_rejected() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        let mut c = Config::new(&src, &dst);
        c.trash_dir = Some(dst.join(".trash"));
        assert_eq!(validate(&c, "s").unwrap_err().code(), 7);
        c.trash_dir = Some(src.join("t"));
        assert_eq!(validate(&c, "s").unwrap_err().code(), 7);

        c.trash_dir = Some(td.path().join("trash"));
        let opts = validate(&c, "20260101-000000").unwrap();
        match opts.delete_mode {
            DeleteMode::Trash(t) => assert!(t.run_dir().ends_with("trash/20260101-000000")),
            DeleteMode::Zap => panic!("expected trash mode"),
        }
    }

    #[test]
    fn jobs_are_clamped() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let mut c = cfg(&src, &td.path().join("dst"));
        c.jobs = 0;
        assert_eq!(validate(&c, "s").unwrap().jobs, 1);
        c.jobs = 10_000;
        assert_eq!(validate(&c, "s").unwrap().jobs, MAX_JOBS);
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(lexical_normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    }

    #[test]
    fn run_stamp_shape() {
        let s = run_stamp();
        assert_eq!(s.len(), 15);
        assert_eq!(&s[8..9], "-");
    }
}
