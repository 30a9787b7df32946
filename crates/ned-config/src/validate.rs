//! Configuration validation errors and semantic validation.

use std::collections::HashSet;
use thiserror::Error;

use crate::study::{StudyConfig, SystemConfig};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate a study configuration semantically.
pub fn validate_study(config: &StudyConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if !(config.sample_duration_secs.is_finite() && config.sample_duration_secs > 0.0) {
        return Err(invalid(
            "sample_duration_secs",
            format!("Must be a positive number, got {}", config.sample_duration_secs),
        ));
    }
    if config.sample_count == 0 {
        return Err(invalid("sample_count", "Must be at least 1"));
    }
    if config.sample_timeout_secs == 0 {
        return Err(invalid("sample_timeout_secs", "Must be at least 1"));
    }
    if config.chunk_size == 0 {
        return Err(invalid("chunk_size", "Must be at least 1"));
    }
    if config.workers == Some(0) {
        return Err(invalid("workers", "Must be at least 1 when set"));
    }

    if !(config.quota.ratio.is_finite() && config.quota.ratio >= 1.0) {
        return Err(invalid(
            "quota.ratio",
            format!("Must be >= 1, got {}", config.quota.ratio),
        ));
    }

    if config.lambdas.is_empty() {
        return Err(ValidationError::SemanticError(
            "At least one lambda must be configured".to_string(),
        ));
    }
    for (idx, spec) in config.lambdas.iter().enumerate() {
        if !spec.lambda.is_finite() {
            return Err(invalid(
                format!("lambdas[{}].lambda", idx),
                format!("Must be finite, got {}", spec.lambda),
            ));
        }
    }

    if config.systems.is_empty() {
        return Err(ValidationError::SemanticError(
            "At least one system must be configured".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for system in &config.systems {
        if !seen.insert(system.id.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "Duplicate system id '{}'",
                system.id
            )));
        }
        validate_system(system)?;
    }

    Ok(())
}

fn validate_system(system: &SystemConfig) -> ValidationResult<()> {
    let field = |name: &str| format!("systems.{}.{}", system.id, name);

    if system.id.trim().is_empty() {
        return Err(invalid("systems.id", "Must not be empty"));
    }
    if !(system.precision.is_finite() && system.precision > 0.0) {
        return Err(invalid(
            field("precision"),
            format!("Must be a positive number, got {}", system.precision),
        ));
    }
    if system.outage_threshold == 0 {
        return Err(invalid(field("outage_threshold"), "Must be at least 1"));
    }
    if let (Some(from), Some(to)) = (system.from, system.to) {
        if from >= to {
            return Err(invalid(
                field("from"),
                format!("Must be before 'to' ({} >= {})", from, to),
            ));
        }
    }
    if system.interactions.is_empty() {
        return Err(invalid(
            field("interactions"),
            "Needs device_globs or all_devices",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::LambdaSpec;

    #[test]
    fn test_defaults_are_valid() {
        validate_study(&StudyConfig::default()).unwrap();
    }

    #[test]
    fn test_version_mismatch() {
        let config = StudyConfig {
            schema_version: "0.9".into(),
            ..Default::default()
        };
        let err = validate_study(&config).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let config = StudyConfig {
            sample_duration_secs: 0.0,
            ..Default::default()
        };
        assert!(validate_study(&config).is_err());
    }

    #[test]
    fn test_rejects_low_quota_ratio() {
        let mut config = StudyConfig::default();
        config.quota.ratio = 0.5;
        let err = validate_study(&config).unwrap_err();
        assert!(err.to_string().contains("quota.ratio"));
    }

    #[test]
    fn test_rejects_empty_lambdas() {
        let config = StudyConfig {
            lambdas: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            validate_study(&config),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn test_rejects_nan_lambda() {
        let config = StudyConfig {
            lambdas: vec![LambdaSpec::new(f64::NAN, "broken")],
            ..Default::default()
        };
        assert!(validate_study(&config).is_err());
    }

    #[test]
    fn test_rejects_duplicate_system() {
        let mut config = StudyConfig::default();
        let first = config.systems[0].clone();
        config.systems.push(first);
        let err = validate_study(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate system id"));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut config = StudyConfig::default();
        config.systems[0].from = Some(200.0);
        config.systems[0].to = Some(100.0);
        let err = validate_study(&config).unwrap_err();
        assert!(err.to_string().contains("systems.1.from"));
    }

    #[test]
    fn test_rejects_empty_selector() {
        let mut config = StudyConfig::default();
        config.systems[0].interactions.device_globs.clear();
        assert!(validate_study(&config).is_err());
    }
}
