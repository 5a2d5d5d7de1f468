#![cfg(unix)]

mod common;

use common::*;
use mirror_backup::Progress;
use mirror_backup::fs_ops::Trash;
use mirror_backup::{run_mirror, DeleteMode, MemoryReporter, MirrorOptions, ShutdownToken};
use std::fs;
use std::os::unix::fs::PermissionsExt;

fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[test]
fn unreadable_file_is_reported_and_the_run_continues() {
    if running_as_root() {
        eprintln!("skipping: permission bits don't bind root");
        return;
    }
    let r = roots();
    let locked = write(&r.src, "a_locked.txt", b"secret");
    write(&r.src, "b_open.txt", b"fine");
    write(&r.dst, "c_stale.txt", b"old");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let rep = MemoryReporter::new();
    let report = run_mirror(options(&r), &rep, ShutdownToken::new());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.stats.failures, 1);
    assert_eq!(report.stats.files_copied_new, 1);
    assert_eq!(report.stats.files_deleted, 1);
    assert!(r.dst.join("b_open.txt").is_file());
    assert!(!r.dst.join("a_locked.txt").exists());
    let failed: Vec<_> = rep.events().into_iter().filter(Progress::is_failure).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].to_string().ends_with("could not copy a_locked.txt"));
    // No temp file left behind by the failed copy.
    assert!(fs::read_dir(&r.dst).unwrap().all(|e| !e.unwrap().file_name().to_string_lossy().ends_with(".tmp")));
}

#[test]
fn read_only_destination_directory_fails_per_file() {
    if running_as_root() {
        eprintln!("skipping: permission bits don't bind root");
        return;
    }
    let r = roots();
    write(&r.src, "ro/new.txt", b"n");
    fs::create_dir_all(r.dst.join("ro")).unwrap();
    write(&r.src, "rw/other.txt", b"o");
    fs::set_permissions(r.dst.join("ro"), fs::Permissions::from_mode(0o555)).unwrap();

    let (report, lines) = run(options(&r));
    // The directory stayed empty, so pruning may already have removed it.
    let _ = fs::set_permissions(r.dst.join("ro"), fs::Permissions::from_mode(0o755));

    assert_eq!(report.stats.failures, 1);
    assert!(r.dst.join("rw/other.txt").is_file());
    assert!(lines.iter().any(|l| l.starts_with("ERROR :: ") && l.ends_with("could not copy new.txt")));
}

#[test]
fn source_links_are_skipped_and_stray_destination_links_removed() {
    let r = roots();
    write(&r.src, "real.txt", b"r");
    std::os::unix::fs::symlink(r.src.join("real.txt"), r.src.join("link.txt")).unwrap();
    std::os::unix::fs::symlink(r.src.join("real.txt"), r.dst.join("link.txt")).unwrap();
    fs::create_dir_all(r.dst.join("old")).unwrap();
    std::os::unix::fs::symlink("/nonexistent", r.dst.join("old/dangling")).unwrap();

    let (report, _) = run(options(&r));
    assert_eq!(report.stats.files_copied_new, 1);
    assert_eq!((report.stats.files_deleted, report.stats.bytes_deleted), (1, 0));
    assert_eq!(report.stats.empty_dirs_removed, 1);
    assert!(fs::symlink_metadata(r.dst.join("old/dangling")).is_err());
    assert!(!r.dst.join("old").exists());
    // A link whose source path still exists is left alone.
    assert!(fs::symlink_metadata(r.dst.join("link.txt")).unwrap().file_type().is_symlink());

    let (again, _) = run(options(&r));
    assert!(!again.stats.has_activity());
}

#[test]
fn stray_link_is_trashed_as_a_link() {
    let r = roots();
    std::os::unix::fs::symlink("/nonexistent/target", r.dst.join("dangling")).unwrap();
    let trash = Trash::new(&r.base.join("trash"), "run");

    let (report, _) = run(MirrorOptions::new(&r.src, &r.dst, DeleteMode::Trash(trash.clone())));
    assert_eq!(report.stats.files_deleted, 1);
    assert!(fs::symlink_metadata(r.dst.join("dangling")).is_err());
    assert_eq!(
        fs::read_link(trash.run_dir().join("dangling")).unwrap(),
        std::path::PathBuf::from("/nonexistent/target")
    );
}
