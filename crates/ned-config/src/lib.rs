//! ned study configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for study.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots embedded in every report

pub mod resolve;
pub mod snapshot;
pub mod study;
pub mod validate;

pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use study::{InteractionSelector, LambdaSpec, QuotaConfig, StudyConfig, SystemConfig};
pub use validate::{validate_study, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
