//! Error types for the ned privacy estimator.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Zero Window Total
//!   Reason: task window total is zero for system 3 at lambda 0.1
//!   Fix: Check the interaction selector for this system ...
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 40,
//!   "category": "estimation",
//!   "message": "task window total is zero for system 3 at lambda 0.1",
//!   "recoverable": true,
//!   "suggested_action": "skip",
//!   "context": { "system": "3", "lambda": 0.1 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for ned operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Study configuration errors.
    Config,
    /// Trace store access errors.
    Source,
    /// Malformed or unusable event traces.
    Trace,
    /// Epsilon/delta estimation errors.
    Estimation,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Source => write!(f, "source"),
            ErrorCategory::Trace => write!(f, "trace"),
            ErrorCategory::Estimation => write!(f, "estimation"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for callers to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Reset configuration to defaults.
    ResetConfig,
    /// Run `ned config validate`.
    RunCheck,
    /// Skip this system or lambda and continue.
    Skip,
    /// Abort the study.
    Abort,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::ResetConfig => write!(f, "reset_config"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::Skip => write!(f, "skip"),
            SuggestedAction::Abort => write!(f, "abort"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for ned.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid study configuration: {0}")]
    InvalidStudy(String),

    // Source errors (20-29)
    #[error("trace source error: {0}")]
    Source(String),

    #[error("system {system} not found in trace source")]
    SystemNotFound { system: String },

    // Trace errors (30-39)
    #[error("timestamps out of order{}: {detail}", for_system(.system))]
    TraceOrdering {
        system: Option<String>,
        detail: String,
    },

    #[error("system {system} has no usable events: {reason}")]
    EmptyTrace { system: String, reason: String },

    // Estimation errors (40-49)
    #[error("{class} window total is zero for system {system} at lambda {lambda}")]
    ZeroDenominator {
        system: String,
        lambda: f64,
        class: String,
    },

    #[error("worker pool failure: {0}")]
    WorkerPool(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

fn for_system(system: &Option<String>) -> String {
    match system {
        Some(id) => format!(" in system {}", id),
        None => String::new(),
    }
}

impl Error {
    /// Attach a system id to errors raised below the per-system layer.
    pub fn in_system(self, id: &str) -> Self {
        match self {
            Error::TraceOrdering { system: None, detail } => Error::TraceOrdering {
                system: Some(id.to_string()),
                detail,
            },
            other => other,
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Source errors
    /// - 30-39: Trace errors
    /// - 40-49: Estimation errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidStudy(_) => 11,
            Error::Source(_) => 20,
            Error::SystemNotFound { .. } => 21,
            Error::TraceOrdering { .. } => 30,
            Error::EmptyTrace { .. } => 31,
            Error::ZeroDenominator { .. } => 40,
            Error::WorkerPool(_) => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidStudy(_) => ErrorCategory::Config,
            Error::Source(_) | Error::SystemNotFound { .. } => ErrorCategory::Source,
            Error::TraceOrdering { .. } | Error::EmptyTrace { .. } => ErrorCategory::Trace,
            Error::ZeroDenominator { .. } | Error::WorkerPool(_) => ErrorCategory::Estimation,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the rest of the study can continue after this error.
    ///
    /// Trace and estimation errors are scoped to one system or one lambda,
    /// so the coordinator records them and moves on.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => false,
            Error::InvalidStudy(_) => false,
            Error::Source(_) => true,
            Error::SystemNotFound { .. } => true,
            Error::TraceOrdering { .. } => true,
            Error::EmptyTrace { .. } => true,
            Error::ZeroDenominator { .. } => true,
            Error::WorkerPool(_) => false,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns the suggested action for callers.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidStudy(_) => SuggestedAction::ResetConfig,
            Error::Source(_) => SuggestedAction::Retry,
            Error::SystemNotFound { .. } => SuggestedAction::Skip,
            Error::TraceOrdering { .. } => SuggestedAction::Skip,
            Error::EmptyTrace { .. } => SuggestedAction::Skip,
            Error::ZeroDenominator { .. } => SuggestedAction::Skip,
            Error::WorkerPool(_) => SuggestedAction::Abort,
            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'ned config validate' to check the study file, or check its JSON syntax."
            }
            Error::InvalidStudy(_) => {
                "Fix the reported field, or start from 'ned config show' which prints the built-in defaults."
            }
            Error::Source(_) => {
                "Check that the database path exists and contains the messages/systems tables."
            }
            Error::SystemNotFound { .. } => {
                "List stored systems with 'ned systems --db <path>' and align the study's system ids."
            }
            Error::TraceOrdering { .. } => {
                "The store returned timestamps out of order. Check the ORDER BY of the source query."
            }
            Error::EmptyTrace { .. } => {
                "The system has too few events for the sample duration. Widen its time bounds or drop it."
            }
            Error::ZeroDenominator { .. } => {
                "Check the interaction selector for this system; windows of one class never occur."
            }
            Error::WorkerPool(_) => {
                "Retry with a smaller '--workers' value. If persistent, report as a bug."
            }
            Error::Io(_) => "Check file permissions and free disk space, then retry.",
            Error::Json(_) => "The JSON document is malformed. Validate it before retrying.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidStudy(_) => "Invalid Study Configuration",
            Error::Source(_) => "Trace Source Error",
            Error::SystemNotFound { .. } => "System Not Found",
            Error::TraceOrdering { .. } => "Trace Ordering Error",
            Error::EmptyTrace { .. } => "Empty Trace",
            Error::ZeroDenominator { .. } => "Zero Window Total",
            Error::WorkerPool(_) => "Worker Pool Failure",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the rest of the study can continue.
    pub recoverable: bool,

    /// Suggested action for callers.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (system id, lambda).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::SystemNotFound { system } | Error::EmptyTrace { system, .. } => {
                context.insert("system".to_string(), serde_json::json!(system));
            }
            Error::TraceOrdering {
                system: Some(system),
                ..
            } => {
                context.insert("system".to_string(), serde_json::json!(system));
            }
            Error::ZeroDenominator {
                system,
                lambda,
                class,
            } => {
                context.insert("system".to_string(), serde_json::json!(system));
                context.insert("lambda".to_string(), serde_json::json!(lambda));
                context.insert("class".to_string(), serde_json::json!(class));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
