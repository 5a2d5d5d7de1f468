//! Configuration: the settings type, where the XML file lives, loading it,
//! and validating the merged result into run options.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{config_path, default_trash_dir, path_has_symlink_ancestor, CONFIG_ENV};
pub use types::{Config, LogLevel};
pub use validate::{run_stamp, validate};
pub use xml::{create_template_config, load_config, load_config_from_xml_path};

/// Upper bound for `jobs`; larger values are clamped.
pub const MAX_JOBS: usize = 64;
