//! Study configuration loading for ned.
//!
//! This module handles:
//! - Locating study.json (CLI > env > XDG > /etc > defaults)
//! - Parsing (shape/type checking via serde)
//! - Applying command-line overrides
//! - Semantic validation of the effective configuration
//! - The config snapshot embedded in reports

pub use ned_config::{
    ConfigPaths, ConfigSnapshot, ConfigSource, InteractionSelector, LambdaSpec, QuotaConfig,
    StudyConfig, SystemConfig, ValidationError, CONFIG_SCHEMA_VERSION,
};

use ned_config::{resolve_config, validate_study};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid study file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown system ids requested: {}", .0.join(", "))]
    UnknownSystems(Vec<String>),
}

impl ConfigError {
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::NotFound { .. } => 10,
            ConfigError::ParseError { .. } => 11,
            ConfigError::ValidationError(e) => e.code(),
            ConfigError::IoError { .. } => 60,
            ConfigError::UnknownSystems(_) => 12,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            ConfigError::NotFound { .. } | ConfigError::UnknownSystems(_) => ExitCode::ArgsError,
            ConfigError::ParseError { .. } | ConfigError::ValidationError(_) => {
                ExitCode::ConfigError
            }
            ConfigError::IoError { .. } => ExitCode::IoError,
        }
    }
}

/// Command-line values that replace study.json values.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seed: Option<u64>,
    pub sample_count: Option<usize>,
    pub sample_timeout_secs: Option<u64>,
    pub workers: Option<usize>,
    /// Restrict the study to these system ids.
    pub systems: Vec<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut StudyConfig) -> Result<(), ConfigError> {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(count) = self.sample_count {
            config.sample_count = count;
        }
        if let Some(timeout) = self.sample_timeout_secs {
            config.sample_timeout_secs = timeout;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if !self.systems.is_empty() {
            let unknown = config.retain_systems(&self.systems);
            if !unknown.is_empty() {
                return Err(ConfigError::UnknownSystems(unknown));
            }
        }
        Ok(())
    }
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit study file path (highest priority).
    pub study_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

/// Effective configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub study: StudyConfig,
    pub paths: ConfigPaths,
    pub snapshot: ConfigSnapshot,
}

impl ResolvedConfig {
    pub fn using_defaults(&self) -> bool {
        self.paths.study.is_none()
    }
}

/// Load, override and validate the study configuration.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let paths = resolve_config(options.study_path.as_deref());

    let mut study = match &paths.study {
        Some(path) => load_study_file(path)?,
        None => StudyConfig::default(),
    };

    options.overrides.apply(&mut study)?;
    validate_study(&study)?;

    let snapshot = ConfigSnapshot::new(&study, &paths);
    Ok(ResolvedConfig {
        study,
        paths,
        snapshot,
    })
}

/// Read and parse one study file without validating it.
pub fn load_study_file(path: &Path) -> Result<StudyConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    StudyConfig::from_json(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// JSON schema of study.json.
pub fn study_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(StudyConfig)).unwrap_or_default()
}
