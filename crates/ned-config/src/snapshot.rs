//! Configuration snapshots for report provenance and reproducibility.
//!
//! A snapshot captures the exact configuration a study ran with, so two
//! reports can be compared by hash and a run can be repeated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::{ConfigPaths, ConfigSource};
use crate::study::StudyConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the study file was loaded from.
    #[serde(default)]
    pub study_path: Option<String>,

    /// Source of the study configuration.
    pub study_source: String,

    /// SHA-256 of the effective configuration (after CLI overrides).
    pub config_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub sample_duration_secs: f64,
    pub sample_count: usize,
    pub sample_timeout_secs: u64,
    pub seed: Option<u64>,
    pub lambda_count: usize,
    pub systems: Vec<String>,
}

impl ConfigSnapshot {
    /// Create a snapshot of the effective configuration.
    pub fn new(config: &StudyConfig, paths: &ConfigPaths) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            study_path: paths.study.as_ref().map(|p| p.display().to_string()),
            study_source: paths.study_source.to_string(),
            config_hash: hash_config(config),
            summary: ConfigSummary::from(config),
        }
    }

    /// Create a snapshot of the built-in defaults.
    pub fn defaults_only() -> Self {
        let paths = ConfigPaths {
            study: None,
            study_source: ConfigSource::BuiltinDefault,
        };
        Self::new(&StudyConfig::default(), &paths)
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}

impl From<&StudyConfig> for ConfigSummary {
    fn from(config: &StudyConfig) -> Self {
        ConfigSummary {
            sample_duration_secs: config.sample_duration_secs,
            sample_count: config.sample_count,
            sample_timeout_secs: config.sample_timeout_secs,
            seed: config.seed,
            lambda_count: config.lambdas.len(),
            systems: config.systems.iter().map(|s| s.id.clone()).collect(),
        }
    }
}

/// Hash the canonical JSON form of the effective configuration.
fn hash_config(config: &StudyConfig) -> String {
    let canonical = serde_json::to_string(config).unwrap_or_default();
    hash_content(&canonical)
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
