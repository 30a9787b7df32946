//! Study reports.
//!
//! One [`StudyReport`] per run, one [`SystemReport`] per configured system
//! and one [`LambdaReport`] per lambda. Failures are recorded in place, so
//! a report always covers every configured system and lambda.

pub mod render;

pub use render::{render, render_latex, render_markdown, render_summary};

use chrono::{DateTime, Utc};
use ned_common::{Error, StructuredError, SystemView};
use ned_config::{ConfigSnapshot, LambdaSpec};
use serde::{Deserialize, Serialize};

use crate::estimate::Estimate;
use crate::matching::WindowTotals;
use crate::sampling::{Rejections, SamplingRun};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyReport {
    pub schema_version: String,
    pub run_id: String,
    pub host_id: String,
    pub generated_at: DateTime<Utc>,
    pub sample_duration_secs: f64,
    pub config: ConfigSnapshot,
    pub systems: Vec<SystemReport>,
}

impl StudyReport {
    /// Number of failed systems plus failed lambdas of surviving systems.
    pub fn failure_count(&self) -> usize {
        self.systems
            .iter()
            .map(|s| {
                if s.error.is_some() {
                    1
                } else {
                    s.lambdas.iter().filter(|l| l.error.is_some()).count()
                }
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Lambdas as configured, taken from the first system that ran.
    pub fn lambdas(&self) -> Vec<f64> {
        self.systems
            .iter()
            .find(|s| !s.lambdas.is_empty())
            .map(|s| s.lambdas.iter().map(|l| l.lambda).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemReport {
    pub system: String,
    pub view: SystemView,
    pub genuine_events: usize,
    pub interactions: usize,
    /// First and last event inside the view, raw seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timespan: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StructuredError>,
    pub lambdas: Vec<LambdaReport>,
}

impl SystemReport {
    pub fn new(view: SystemView) -> Self {
        Self {
            system: view.id().to_string(),
            view,
            genuine_events: 0,
            interactions: 0,
            timespan: None,
            error: None,
            lambdas: Vec::new(),
        }
    }

    pub fn fail(&mut self, err: &Error) {
        self.error = Some(StructuredError::from(err).with_context("system", &self.system));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaReport {
    pub lambda: f64,
    pub label: String,
    pub padded_events: usize,
    pub dummy_events: usize,
    /// `|padded| / |genuine| - 1`.
    pub traffic_increase: f64,
    pub totals: WindowTotals,
    pub estimate: Estimate,
    pub samples: SampleStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StructuredError>,
}

impl LambdaReport {
    pub fn new(spec: &LambdaSpec, target: usize) -> Self {
        Self {
            lambda: spec.lambda,
            label: spec.label.clone(),
            padded_events: 0,
            dummy_events: 0,
            traffic_increase: 0.0,
            totals: WindowTotals::default(),
            estimate: Estimate::Undefined {
                reason: "not estimated".to_string(),
            },
            samples: SampleStats::new(target),
            error: None,
        }
    }

    pub fn fail(&mut self, err: &Error) {
        self.estimate = Estimate::Undefined {
            reason: err.to_string(),
        };
        self.error = Some(StructuredError::from(err).with_context("lambda", self.lambda));
    }
}

/// Sampling statistics of one lambda run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub target: usize,
    pub achieved: usize,
    pub task: usize,
    pub notask: usize,
    pub draws: u64,
    pub timed_out: bool,
    pub elapsed_ms: u64,
    pub rejections: Rejections,
}

impl SampleStats {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn record(&mut self, run: &SamplingRun) {
        self.achieved = run.dispatched;
        self.task = run.task_samples;
        self.notask = run.notask_samples;
        self.draws = run.draws;
        self.timed_out = run.timed_out;
        self.elapsed_ms = run.elapsed.as_millis() as u64;
        self.rejections = run.rejections;
    }
}
