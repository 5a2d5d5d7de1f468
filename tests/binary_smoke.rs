use assert_cmd::cargo::cargo_bin;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use std::fs;
use std::process::Command;

/// Binary invocation isolated from the user's real config file.
fn mirror_backup(cfg_dir: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin!("mirror_backup"));
    let base = dunce::canonicalize(cfg_dir.path()).unwrap();
    cmd.env("MIRROR_BACKUP_CONFIG", base.join("config.xml"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn license_prints_gpl_notice() {
    let td = TempDir::new().unwrap();
    let out = mirror_backup(&td).arg("--license").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("GNU General Public License"));
}

#[test]
fn missing_source_exits_1() {
    let td = TempDir::new().unwrap();
    let out = mirror_backup(&td).args(["-d", "/tmp/whatever"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_destination_exits_2() {
    let td = TempDir::new().unwrap();
    td.child("src").create_dir_all().unwrap();
    let out = mirror_backup(&td).arg("-s").arg(td.child("src").path()).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn nonexistent_source_exits_4() {
    let td = TempDir::new().unwrap();
    let out = mirror_backup(&td)
        .arg("-s")
        .arg(td.path().join("nope"))
        .arg("-d")
        .arg(td.path().join("dst"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
}

#[test]
fn bad_config_exits_8() {
    let td = TempDir::new().unwrap();
    td.child("config.xml").write_str("<config><nonsense>1</nonsense></config>").unwrap();
    let out = mirror_backup(&td).arg("--print-config").output().unwrap();
    assert!(out.status.success(), "--print-config doesn't parse the file");
    let out = mirror_backup(&td).args(["-s", "/a", "-d", "/b"]).output().unwrap();
    assert_eq!(out.status.code(), Some(8));
}

#[test]
fn full_run_mirrors_and_reports() {
    let td = TempDir::new().unwrap();
    td.child("src/docs/readme.txt").write_str("hello").unwrap();
    td.child("dst/stale.txt").write_str("old").unwrap();

    let out = mirror_backup(&td)
        .arg("-s")
        .arg(td.child("src").path())
        .arg("-d")
        .arg(td.child("dst").path())
        .arg("--zap")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Copying : file does not exist in destination :: readme.txt"));
    assert!(stdout.contains("Deleting : file does not exist in source :: stale.txt"));
    assert!(stdout.contains("Completed "));
    td.child("dst/docs/readme.txt").assert("hello");
    assert!(!td.path().join("dst/stale.txt").exists());
}

#[test]
fn test_mode_leaves_destination_alone() {
    let td = TempDir::new().unwrap();
    td.child("src/new.txt").write_str("n").unwrap();
    td.child("dst/stale.txt").write_str("s").unwrap();

    let out = mirror_backup(&td)
        .arg("-s")
        .arg(td.child("src").path())
        .arg("-d")
        .arg(td.child("dst").path())
        .args(["--test", "--zap"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("in test mode"));
    assert!(!td.path().join("dst/new.txt").exists());
    assert_eq!(fs::read(td.path().join("dst/stale.txt")).unwrap(), b"s");
}

#[test]
fn init_config_writes_a_loadable_template() {
    let td = TempDir::new().unwrap();
    let out = mirror_backup(&td).arg("--init-config").output().unwrap();
    assert!(out.status.success());
    let written = dunce::canonicalize(td.path()).unwrap().join("config.xml");
    let text = fs::read_to_string(&written).unwrap();
    assert!(text.contains("<config>"));
    let cfg = mirror_backup::config::load_config_from_xml_path(&written).unwrap();
    assert_eq!(cfg, mirror_backup::Config::default());
}
