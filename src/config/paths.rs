//! Default locations and symlink checks.

use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "MIRROR_BACKUP_CONFIG";

const APP_DIR: &str = "mirror_backup";

/// Config file in use: `$MIRROR_BACKUP_CONFIG` if set (a directory there means
/// `<dir>/config.xml`), otherwise `<config dir>/mirror_backup/config.xml`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        let p = PathBuf::from(raw);
        let p = if p.is_relative() {
            env::current_dir().map(|cwd| cwd.join(&p)).unwrap_or(p)
        } else {
            p
        };
        return Some(if p.is_dir() { p.join("config.xml") } else { p });
    }
    home_fallback(config_dir(), ".config").map(|base| base.join(APP_DIR).join("config.xml"))
}

/// Default trash base: `<data dir>/mirror_backup/trash`.
pub fn default_trash_dir() -> Option<PathBuf> {
    home_fallback(data_dir(), ".local/share").map(|base| base.join(APP_DIR).join("trash"))
}

fn home_fallback(platform: Option<PathBuf>, rel: &str) -> Option<PathBuf> {
    platform.or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(rel)))
}

/// True if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    for anc in path.ancestors().skip(1) {
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn env_directory_means_config_xml_inside() {
        let td = tempdir().unwrap();
        unsafe { env::set_var(CONFIG_ENV, td.path()) };
        let p = config_path();
        unsafe { env::remove_var(CONFIG_ENV) };
        assert_eq!(p, Some(td.path().join("config.xml")));
    }

    #[test]
    #[serial]
    fn env_file_is_used_verbatim() {
        let td = tempdir().unwrap();
        let file = td.path().join("custom.xml");
        unsafe { env::set_var(CONFIG_ENV, &file) };
        let p = config_path();
        unsafe { env::remove_var(CONFIG_ENV) };
        assert_eq!(p, Some(file));
    }

    #[test]
    fn trash_default_is_app_scoped() {
        if let Some(p) = default_trash_dir() {
            assert!(p.ends_with("mirror_backup/trash"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlinked_ancestor() {
        let td = tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir_all(&real).unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(path_has_symlink_ancestor(&link.join("app.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("app.log")).unwrap());
    }
}
