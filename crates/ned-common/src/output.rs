//! Output formats.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported output formats for study reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full structured JSON report (default for machine consumption)
    #[default]
    Json,

    /// One line per system and lambda
    Summary,

    /// Human-readable Markdown table
    Md,

    /// LaTeX tabular rows, one per system
    Latex,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Md => write!(f, "md"),
            OutputFormat::Latex => write!(f, "latex"),
        }
    }
}
