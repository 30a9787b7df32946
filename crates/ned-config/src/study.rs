//! Study configuration types.
//!
//! These types match study.json. Every field has a default, so a partial
//! file only overrides what it names.

use ned_common::{SystemId, SystemView};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Reconfiguration date that splits system 2 (2012-11-11 00:00 CET).
const SYSTEM_2_SPLIT: f64 = 1_352_588_400.0;

/// Complete study configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StudyConfig {
    pub schema_version: String,

    pub description: Option<String>,

    /// Observation window duration in seconds.
    pub sample_duration_secs: f64,

    /// Target number of accepted samples per lambda.
    pub sample_count: usize,

    /// Wall-clock budget for drawing samples per lambda, in seconds.
    pub sample_timeout_secs: u64,

    /// Genuine events per generator chunk.
    pub chunk_size: usize,

    /// Worker threads per pool (`None` = number of CPUs).
    pub workers: Option<usize>,

    /// Study seed (`None` = OS entropy, non-reproducible).
    pub seed: Option<u64>,

    pub quota: QuotaConfig,

    pub lambdas: Vec<LambdaSpec>,

    pub systems: Vec<SystemConfig>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            sample_duration_secs: 10.0,
            sample_count: 1000,
            sample_timeout_secs: 900,
            chunk_size: 5000,
            workers: None,
            seed: None,
            quota: QuotaConfig::default(),
            lambdas: default_lambdas(),
            systems: default_systems(),
        }
    }
}

impl StudyConfig {
    /// Load a study configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse a study configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Look up a configured system by id.
    pub fn system(&self, id: &str) -> Option<&SystemConfig> {
        self.systems.iter().find(|s| s.id == id)
    }

    /// Keep only the systems whose ids are listed. Unknown ids are returned.
    pub fn retain_systems(&mut self, ids: &[String]) -> Vec<String> {
        let unknown = ids
            .iter()
            .filter(|id| self.system(id).is_none())
            .cloned()
            .collect();
        self.systems.retain(|s| ids.contains(&s.id));
        unknown
    }
}

/// Class balance rule of the sampler.
///
/// A draw of one class is rejected when accepting it would make
/// `count(class) > ratio * count(other) + slack`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct QuotaConfig {
    pub ratio: f64,
    pub slack: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            ratio: 1.5,
            slack: 900,
        }
    }
}

/// One dummy traffic rate to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LambdaSpec {
    /// Dummy events per second. Negative disables padding.
    pub lambda: f64,

    #[serde(default)]
    pub label: String,
}

impl LambdaSpec {
    pub fn new(lambda: f64, label: impl Into<String>) -> Self {
        Self {
            lambda,
            label: label.into(),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.lambda < 0.0
    }
}

/// Per-system analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SystemConfig {
    /// Identifier used in reports ("1", "2.1").
    pub id: String,

    /// Stored system to read from, when different from `id`.
    #[serde(default)]
    pub source: Option<String>,

    /// Inclusive lower bound on raw timestamps.
    #[serde(default)]
    pub from: Option<f64>,

    /// Inclusive upper bound on raw timestamps.
    #[serde(default)]
    pub to: Option<f64>,

    #[serde(default)]
    pub description: Option<String>,

    /// Gap (in precision units) above which traffic is considered down.
    pub outage_threshold: u64,

    /// Seconds per timestamp unit.
    #[serde(default = "default_precision")]
    pub precision: f64,

    #[serde(default)]
    pub interactions: InteractionSelector,
}

fn default_precision() -> f64 {
    1.0
}

impl SystemConfig {
    /// The view of the trace store this system reads.
    pub fn view(&self) -> SystemView {
        if self.source.is_none() && self.from.is_none() && self.to.is_none() {
            return SystemView::Unbounded {
                id: SystemId::new(self.id.clone()),
            };
        }
        SystemView::Bounded {
            id: SystemId::new(self.id.clone()),
            base: SystemId::new(self.source.clone().unwrap_or_else(|| self.id.clone())),
            from: self.from,
            to: self.to,
        }
    }
}

/// Which messages count as user interactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InteractionSelector {
    /// SQLite GLOB patterns matched against the sending device description.
    pub device_globs: Vec<String>,

    /// Treat every message with presence information as an interaction.
    pub all_devices: bool,
}

impl Default for InteractionSelector {
    fn default() -> Self {
        Self {
            device_globs: vec!["*3S*".into(), "F *.*".into(), "* KF *.*".into()],
            all_devices: false,
        }
    }
}

impl InteractionSelector {
    pub fn all() -> Self {
        Self {
            device_globs: Vec::new(),
            all_devices: true,
        }
    }

    /// Whether the selector can match anything at all.
    pub fn is_empty(&self) -> bool {
        !self.all_devices && self.device_globs.is_empty()
    }
}

fn default_lambdas() -> Vec<LambdaSpec> {
    vec![
        LambdaSpec::new(-1.0, "No dummy traffic"),
        LambdaSpec::new(0.001, "~1 packet per 20 minutes, very low overhead"),
        LambdaSpec::new(0.01, "~1 packet per 100 seconds, low overhead"),
        LambdaSpec::new(1.0 / 60.0, "~1 packet per minute"),
        LambdaSpec::new(
            0.1,
            "~1 packet per 10 seconds, higher than usual present IA times",
        ),
        LambdaSpec::new(0.5, "~1 packet per 2 seconds"),
        LambdaSpec::new(1.0, "~1 packet per second"),
    ]
}

fn default_systems() -> Vec<SystemConfig> {
    let system = |id: &str, outage_threshold: u64, precision: f64| SystemConfig {
        id: id.to_string(),
        source: None,
        from: None,
        to: None,
        description: None,
        outage_threshold,
        precision,
        interactions: InteractionSelector::default(),
    };

    vec![
        system("1", 10_000, 1.0),
        SystemConfig {
            source: Some("2".into()),
            to: Some(SYSTEM_2_SPLIT),
            description: Some("System 2 before the split".into()),
            ..system("2.1", 100_000, 1.0)
        },
        SystemConfig {
            source: Some("2".into()),
            from: Some(SYSTEM_2_SPLIT),
            description: Some("System 2 after the split".into()),
            ..system("2.2", 100_000, 1.0)
        },
        SystemConfig {
            interactions: InteractionSelector::all(),
            ..system("3", 100_000_000, 0.001)
        },
    ]
}
