//! Candidate window totals.
//!
//! One walk over the padded trace measures how many window starts are task
//! and non-task. These are the denominators of the privacy estimate.

use ned_common::{Error, Result};
use ned_math::lower_bound;
use serde::{Deserialize, Serialize};

use crate::trace::{InteractionSet, PaddedTrace};

/// Number of candidate window starts per class, the estimator's denominators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowTotals {
    pub task: u64,
    pub notask: u64,
}

impl WindowTotals {
    /// Both classes must have at least one window.
    pub fn ensure_positive(&self, system: &str, lambda: f64) -> Result<()> {
        let zero = |class: &str| Error::ZeroDenominator {
            system: system.to_string(),
            lambda,
            class: class.to_string(),
        };
        if self.task == 0 {
            return Err(zero("task"));
        }
        if self.notask == 0 {
            return Err(zero("non-task"));
        }
        Ok(())
    }
}

/// Walk the padded trace once and split the candidate window starts into
/// task and non-task totals.
pub fn count_window_totals(
    trace: &PaddedTrace,
    interactions: &InteractionSet,
    to: u64,
    duration: u64,
    outage_threshold: u64,
) -> WindowTotals {
    let events = trace.events();
    let pending = interactions.as_slice();
    let n = events.len();
    let limit = to.saturating_sub(duration);

    let mut totals = WindowTotals::default();
    let mut next = 0;
    let mut i = 0;

    while i < n && events[i] < limit {
        let current = events[i];
        let after = trace.lower_bound(current.saturating_add(duration));
        if after == n {
            break;
        }
        let span = events[after] - current;

        if span > outage_threshold {
            i = after;
            next = lower_bound(pending, events[after]);
            continue;
        }

        while next < pending.len() && pending[next] < current {
            next += 1;
        }

        if let Some(&interaction) = pending.get(next) {
            let distance = interaction - current;
            if distance < duration {
                totals.task += distance;
                i = trace.lower_bound(interaction);
                next += 1;
                continue;
            }
            if distance < outage_threshold {
                totals.task += duration;
                totals.notask += distance - duration;
                i = trace.lower_bound(interaction);
                next += 1;
                continue;
            }
        }

        totals.notask += span;
        i = after;
    }

    totals
}
