//! Locates the `clann.toml` to load.
//!
//! Lookup stops at the first hit: the `--config` argument, `clann.toml` then
//! `.clann.toml` in the working directory, `config.toml` under
//! `$CLANN_CONFIG_DIR` (or `~/.clann`). Without a hit clann runs on defaults.

use std::path::{Path, PathBuf};

/// Outcome of the config lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named on the command line; loaded even if that fails later.
    Explicit(PathBuf),
    /// Next to the analyzed project.
    Project(PathBuf),
    /// Per-user file.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// File to load, or `None` for built-in defaults.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Whether the per-user file was picked.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

const PROJECT_CONFIG_NAMES: [&str; 2] = ["clann.toml", ".clann.toml"];
const GLOBAL_CONFIG_NAME: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "CLANN_CONFIG_DIR";

/// Picks the config file for a run started in `working_dir`.
#[must_use]
pub fn resolve(working_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(working_dir, explicit, global_config_dir())
}

fn resolve_inner(
    working_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(found) = PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| working_dir.join(name))
        .find(|candidate| candidate.is_file())
    {
        tracing::debug!("Config {} found in working directory", found.display());
        return ConfigSource::Project(found);
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|candidate| candidate.is_file())
        .map_or(ConfigSource::Default, |found| {
            tracing::debug!("Config {} found in user directory", found.display());
            ConfigSource::Global(found)
        })
}

/// `$CLANN_CONFIG_DIR` when set, otherwise `~/.clann`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|h| h.join(".clann")))
}
