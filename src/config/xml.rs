//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request (`--init-config`).
//!
//! Unknown elements are rejected so a typo never silently falls back to a default.

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{config_path, default_trash_dir, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use crate::errors::MirrorError;
use crate::platform::{set_dir_mode_0700, write_config_secure_0600};

/// Mirrors the on-disk XML. Every element is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config", deny_unknown_fields)]
struct XmlConfig {
    source: Option<String>,
    destination: Option<String>,
    zap: Option<String>,
    trash_dir: Option<String>,
    preserve_permissions: Option<String>,
    jobs: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(field: &str, raw: Option<&str>) -> Result<Option<bool>> {
    match non_empty(raw) {
        None => Ok(None),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => bail!("<{field}> must be true or false, got '{v}'"),
        },
    }
}

// Map XmlConfig onto `base`; absent or blank elements keep the base value.
fn apply_xml(parsed: XmlConfig, mut cfg: Config) -> Result<Config> {
    if let Some(s) = non_empty(parsed.source.as_deref()) {
        cfg.source = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.destination.as_deref()) {
        cfg.destination = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.trash_dir.as_deref()) {
        cfg.trash_dir = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    if let Some(s) = non_empty(parsed.jobs.as_deref()) {
        let jobs: usize = s.parse().with_context(|| format!("<jobs> must be a positive number, got '{s}'"))?;
        if jobs == 0 {
            bail!("<jobs> must be at least 1");
        }
        cfg.jobs = jobs;
    }
    if let Some(zap) = parse_bool("zap", parsed.zap.as_deref())? {
        cfg.zap = zap;
    }
    if let Some(p) = parse_bool("preserve_permissions", parsed.preserve_permissions.as_deref())? {
        cfg.preserve_permissions = p;
    }
    Ok(cfg)
}

/// Parse XML text on top of `base`.
pub fn parse_config_str(contents: &str, base: Config) -> Result<Config> {
    let parsed: XmlConfig = if contents.trim().is_empty() {
        XmlConfig::default()
    } else {
        from_xml_str(contents).context("parse config xml")?
    };
    apply_xml(parsed, base)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    parse_config_str(&contents, Config::default())
        .with_context(|| format!("invalid config '{}'", path.display()))
}

/// Defaults overlaid with the config file, if there is one.
///
/// A missing file is not an error. Unreadable or invalid files are
/// `MirrorError::Config`.
pub fn load_config() -> Result<(Config, Option<PathBuf>), MirrorError> {
    let Some(path) = config_path() else {
        debug!("no config directory on this platform; using defaults");
        return Ok((Config::default(), None));
    };
    if !path.exists() {
        debug!(path = %path.display(), "config file not found; using defaults");
        return Ok((Config::default(), None));
    }
    let cfg = load_config_from_xml_path(&path).map_err(|e| MirrorError::Config(format!("{e:#}")))?;
    debug!(path = %path.display(), "loaded config");
    Ok((cfg, Some(path)))
}

/// Write a commented template to `path` (0600 on Unix). Refuses a path behind a symlinked ancestor.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!("Refusing to create config: an ancestor of {} is a symlink", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    let trash = default_trash_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/trash".into());

    let content = format!(
        "<!--\n  mirror_backup configuration (XML)\n\n  source                -> directory to back up\n  destination           -> mirror directory (created if missing)\n  zap                   -> true: delete permanently; false: move deleted files to the trash\n  trash_dir             -> where deleted files are kept (default {trash})\n  preserve_permissions  -> copy permission bits along with contents and timestamps\n  jobs                  -> worker threads per pass (1 = sequential)\n  log_level             -> quiet | normal | info | debug\n  log_file              -> optional log file path\n\n  Command-line flags override these values.\n-->\n<config>\n  <source></source>\n  <destination></destination>\n  <zap>false</zap>\n  <trash_dir></trash_dir>\n  <preserve_permissions>false</preserve_permissions>\n  <jobs>1</jobs>\n  <log_level>normal</log_level>\n  <log_file></log_file>\n</config>\n"
    );

    write_config_secure_0600(path, content.as_bytes())?;
    info!(path = %path.display(), "created template config");
    Ok(())
}
