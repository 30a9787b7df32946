//! Study file discovery.
//!
//! Resolution order: CLI argument, `NED_STUDY_CONFIG`,
//! `NED_CONFIG_DIR/study.json`, the XDG config directory, `/etc/ned`, and
//! finally the built-in defaults.

use std::path::{Path, PathBuf};

/// Where the study file was found.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// `None` when the built-in defaults are used.
    pub study: Option<PathBuf>,
    pub study_source: ConfigSource,
}

/// Origin of the study configuration, for diagnostics and snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    CliArgument,
    Environment,
    XdgConfig,
    SystemConfig,
    #[default]
    BuiltinDefault,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::CliArgument => "CLI argument",
            ConfigSource::Environment => "environment variable",
            ConfigSource::XdgConfig => "XDG config",
            ConfigSource::SystemConfig => "system config",
            ConfigSource::BuiltinDefault => "builtin default",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const ENV_STUDY_PATH: &str = "NED_STUDY_CONFIG";
const ENV_CONFIG_DIR: &str = "NED_CONFIG_DIR";
const STUDY_FILENAME: &str = "study.json";
const APP_NAME: &str = "ned";

/// Resolve the study file path.
///
/// An explicit CLI path is returned even when it does not exist, so the
/// loader can report it instead of silently falling back.
pub fn resolve_config(cli_study: Option<&Path>) -> ConfigPaths {
    if let Some(path) = cli_study {
        return ConfigPaths {
            study: Some(path.to_path_buf()),
            study_source: ConfigSource::CliArgument,
        };
    }

    candidates(|key| std::env::var(key).ok())
        .into_iter()
        .find(|(path, _)| path.is_file())
        .map(|(path, source)| ConfigPaths {
            study: Some(path),
            study_source: source,
        })
        .unwrap_or_default()
}

/// Fallback locations in priority order.
fn candidates(env: impl Fn(&str) -> Option<String>) -> Vec<(PathBuf, ConfigSource)> {
    let mut out = Vec::new();
    if let Some(path) = env(ENV_STUDY_PATH) {
        out.push((PathBuf::from(path), ConfigSource::Environment));
    }
    if let Some(dir) = env(ENV_CONFIG_DIR) {
        out.push((
            PathBuf::from(dir).join(STUDY_FILENAME),
            ConfigSource::Environment,
        ));
    }
    if let Some(dir) = xdg_config_dir() {
        out.push((dir.join(STUDY_FILENAME), ConfigSource::XdgConfig));
    }
    out.push((
        system_config_dir().join(STUDY_FILENAME),
        ConfigSource::SystemConfig,
    ));
    out
}

/// `~/.config/ned` (or the platform equivalent).
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
