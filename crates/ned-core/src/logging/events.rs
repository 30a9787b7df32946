//! Structured event vocabulary for logging.
//!
//! All events carry correlation IDs (run_id, host_id), the pipeline stage
//! and, below the study level, the system being analysed.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Processing stages of a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading genuine events and interactions.
    Load,
    /// Dummy traffic generation.
    Generate,
    /// Candidate window totals.
    Count,
    /// Window sampling.
    Sample,
    /// Pattern matching in the worker pool.
    Match,
    /// Epsilon/delta aggregation.
    Estimate,
    /// Report rendering.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Generate => "generate",
            Stage::Count => "count",
            Stage::Sample => "sample",
            Stage::Match => "match",
            Stage::Estimate => "estimate",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Load stage
    pub const LOAD_FINISHED: &str = "load.finished";
    pub const SYSTEM_FAILED: &str = "system.failed";

    // Generate stage
    pub const GENERATE_STARTED: &str = "generate.started";
    pub const GENERATE_FINISHED: &str = "generate.finished";

    // Count stage
    pub const COUNT_FINISHED: &str = "count.finished";

    // Sample stage
    pub const SAMPLE_STARTED: &str = "sample.started";
    pub const SAMPLE_TIMEOUT: &str = "sample.timeout";
    pub const SAMPLE_FINISHED: &str = "sample.finished";

    // Match/estimate stages
    pub const MATCH_FINISHED: &str = "match.finished";
    pub const ESTIMATE_FINISHED: &str = "estimate.finished";
    pub const LAMBDA_FAILED: &str = "lambda.failed";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation context shared by all events of one run.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Host identifier.
    pub host_id: String,
    /// System under analysis, once the study reaches one.
    pub system: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            host_id: host_id.into(),
            system: None,
        }
    }

    /// Derive a context scoped to one system.
    pub fn with_system(&self, system: impl Into<String>) -> Self {
        LogContext {
            system: Some(system.into()),
            ..self.clone()
        }
    }

    /// System id for log fields ("-" outside a system).
    pub fn system_field(&self) -> &str {
        self.system.as_deref().unwrap_or("-")
    }
}
