//! Window sampling loop.
//!
//! Draws uniform window starts, drops windows that touch an outage, labels
//! the rest against the interaction set and keeps the two classes within
//! the configured quota. Accepted samples are deduplicated and dispatched
//! to the caller, usually a matcher pool.

use std::time::{Duration, Instant};

use ned_common::{Error, Result};
use ned_config::QuotaConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::registry::SampleRegistry;
use super::window::{build_window, crosses_outage, Sample};
use crate::trace::{InteractionSet, PaddedTrace};

/// Parameters of one sampling run, in units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerParams {
    pub from: u64,
    pub to: u64,
    pub duration: u64,
    pub outage_threshold: u64,
    pub sample_count: usize,
    pub timeout: Duration,
    pub quota: QuotaConfig,
}

/// Draws that did not become samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejections {
    pub outage: u64,
    pub quota: u64,
    pub duplicate: u64,
}

impl Rejections {
    pub fn total(&self) -> u64 {
        self.outage + self.quota + self.duplicate
    }
}

/// Outcome of one sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingRun {
    pub dispatched: usize,
    pub task_samples: usize,
    pub notask_samples: usize,
    pub draws: u64,
    pub rejections: Rejections,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Draws random windows over a padded trace and hands accepted samples on.
pub struct SampleCollector<'a> {
    trace: &'a PaddedTrace,
    interactions: &'a InteractionSet,
    params: SamplerParams,
    registry: SampleRegistry,
    first_start: u64,
    last_start: u64,
}

impl<'a> SampleCollector<'a> {
    /// Fails with `EmptyTrace` when no window start fits in `[from + 1, to - duration]`.
    pub fn new(
        system: &str,
        trace: &'a PaddedTrace,
        interactions: &'a InteractionSet,
        params: SamplerParams,
    ) -> Result<Self> {
        let first_start = params.from.saturating_add(1);
        let last_start = params.to.checked_sub(params.duration);
        let last_start = match last_start {
            Some(last) if last >= first_start => last,
            _ => {
                return Err(Error::EmptyTrace {
                    system: system.to_string(),
                    reason: format!(
                        "timespan {}..{} is shorter than one window of {} units",
                        params.from, params.to, params.duration
                    ),
                })
            }
        };
        Ok(Self {
            trace,
            interactions,
            params,
            registry: SampleRegistry::new(),
            first_start,
            last_start,
        })
    }

    /// Draw until `sample_count` samples were dispatched or the timeout hit.
    pub fn collect<R: Rng, F: FnMut(Sample)>(&mut self, rng: &mut R, mut dispatch: F) -> SamplingRun {
        let started = Instant::now();
        let mut run = SamplingRun {
            dispatched: 0,
            task_samples: 0,
            notask_samples: 0,
            draws: 0,
            rejections: Rejections::default(),
            timed_out: false,
            elapsed: Duration::ZERO,
        };
        let mut buf = Vec::new();

        while run.dispatched < self.params.sample_count {
            if started.elapsed() >= self.params.timeout {
                run.timed_out = true;
                break;
            }
            run.draws += 1;

            let start = rng.random_range(self.first_start..=self.last_start);
            let (first, end) = build_window(self.trace, start, self.params.duration, &mut buf);
            if crosses_outage(self.trace, first, end, self.params.outage_threshold) {
                run.rejections.outage += 1;
                continue;
            }

            let task = self
                .interactions
                .any_within(start, start.saturating_add(self.params.duration));
            let over = if task {
                self.over_quota(run.task_samples, run.notask_samples)
            } else {
                self.over_quota(run.notask_samples, run.task_samples)
            };
            if over {
                run.rejections.quota += 1;
                continue;
            }

            let Some(deltas) = self.registry.register(&buf) else {
                run.rejections.duplicate += 1;
                continue;
            };

            if task {
                run.task_samples += 1;
            } else {
                run.notask_samples += 1;
            }
            run.dispatched += 1;
            dispatch(Sample {
                start,
                deltas,
                task,
            });
        }

        run.elapsed = started.elapsed();
        run
    }

    /// Whether accepting one more sample of a class would lift it above
    /// `ratio * other + slack`.
    fn over_quota(&self, mine: usize, other: usize) -> bool {
        (mine + 1) as f64 > self.params.quota.ratio * other as f64 + self.params.quota.slack as f64
    }
}
