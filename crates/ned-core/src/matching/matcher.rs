//! Exact sample matching.
//!
//! Counts every window start in the padded trace that reproduces a sample,
//! split into task and non-task windows. Runs on worker threads against a
//! shared read-only trace.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::trace::{InteractionSet, PaddedTrace};

/// Number of window starts that reproduce a sample, by class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    pub task: u64,
    pub notask: u64,
}

impl MatchCounts {
    fn record(&mut self, task: bool) {
        if task {
            self.task += 1;
        } else {
            self.notask += 1;
        }
    }
}

/// Counts the windows of a padded trace that yield a given sample.
///
/// A window starting at `t` yields sample `s` (with `s[0] = d0`) when its
/// first event sits at index `i` with `t = padded[i] - d0`, the preceding
/// gap exceeds `d0`, the following deltas equal `ia[i..]`, and the event
/// after the span lies beyond `t + duration`. Gaps on either side of the
/// span must not be outages.
#[derive(Debug, Clone)]
pub struct Matcher {
    trace: Arc<PaddedTrace>,
    interactions: Arc<InteractionSet>,
    duration: u64,
    outage_threshold: u64,
}

impl Matcher {
    pub fn new(
        trace: Arc<PaddedTrace>,
        interactions: Arc<InteractionSet>,
        duration: u64,
        outage_threshold: u64,
    ) -> Self {
        Self {
            trace,
            interactions,
            duration,
            outage_threshold,
        }
    }

    pub fn count(&self, sample: &[u64]) -> MatchCounts {
        match sample.len() {
            0 => self.count_empty(),
            1 => self.count_single(sample[0]),
            _ => self.count_pattern(sample),
        }
    }

    /// Empty windows fit `ia - duration` times into every non-outage gap
    /// longer than the window.
    fn count_empty(&self) -> MatchCounts {
        let notask = self
            .trace
            .inter_arrivals()
            .iter()
            .filter(|&&ia| ia <= self.outage_threshold && ia > self.duration)
            .map(|&ia| ia - self.duration)
            .sum();
        MatchCounts { task: 0, notask }
    }

    fn count_single(&self, d0: u64) -> MatchCounts {
        let mut counts = MatchCounts::default();
        let events = self.trace.events();
        let ia = self.trace.inter_arrivals();
        if ia.len() < 2 {
            return counts;
        }
        for i in 1..ia.len() {
            let (before, after) = (ia[i - 1], ia[i]);
            if before > self.outage_threshold || after > self.outage_threshold {
                continue;
            }
            if before > d0 && after + d0 > self.duration {
                counts.record(self.is_task(events[i] - d0));
            }
        }
        counts
    }

    fn count_pattern(&self, sample: &[u64]) -> MatchCounts {
        let mut counts = MatchCounts::default();
        let events = self.trace.events();
        let ia = self.trace.inter_arrivals();
        let len = sample.len();
        let d0 = sample[0];
        if ia.len() < len {
            return counts;
        }

        // i is the index of the first event of a candidate window
        let mut i = 1;
        while i + len < events.len() {
            let before = ia[i - 1];
            if before == 0 {
                i += 1;
                while i + len < events.len() && ia[i - 1] == 0 {
                    i += 1;
                }
                continue;
            }
            if before <= d0 || before > self.outage_threshold || ia[i] != sample[1] {
                i += 1;
                continue;
            }
            if ia[i..i + len - 1] == sample[1..]
                && events[i + len] - events[i] + d0 > self.duration
                && ia[i + len - 1] <= self.outage_threshold
            {
                counts.record(self.is_task(events[i] - d0));
            }
            i += 1;
        }
        counts
    }

    #[inline]
    fn is_task(&self, start: u64) -> bool {
        self.interactions
            .any_within(start, start.saturating_add(self.duration))
    }
}
