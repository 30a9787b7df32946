//! (ε, δ) estimation from per-sample match counts.
//!
//! For every sample the probability of observing it is estimated once for
//! task windows (`p1 = task matches / task total`) and once for non-task
//! windows (`p2`). A sample seen in only one class raises δ; a sample seen
//! in both raises ε to `ln(max(p1, p2) / min(p1, p2))`.

use ned_common::Result;
use ned_math::{log_ratio, occurrence_probability};
use serde::{Deserialize, Serialize};

use crate::matching::{MatchCounts, WindowTotals};

/// Result of one lambda run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Estimate {
    Defined { epsilon: f64, delta: f64 },
    Undefined { reason: String },
}

impl Estimate {
    pub fn is_defined(&self) -> bool {
        matches!(self, Estimate::Defined { .. })
    }

    pub fn epsilon(&self) -> Option<f64> {
        match self {
            Estimate::Defined { epsilon, .. } => Some(*epsilon),
            Estimate::Undefined { .. } => None,
        }
    }

    pub fn delta(&self) -> Option<f64> {
        match self {
            Estimate::Defined { delta, .. } => Some(*delta),
            Estimate::Undefined { .. } => None,
        }
    }
}

/// Running maximum of ε and δ over the samples of one lambda run.
#[derive(Debug, Clone)]
pub struct PrivacyAccumulator {
    totals: WindowTotals,
    epsilon: f64,
    delta: f64,
    observed: u64,
}

impl PrivacyAccumulator {
    /// Fails with `ZeroDenominator` when either window total is zero.
    pub fn new(totals: WindowTotals, system: &str, lambda: f64) -> Result<Self> {
        totals.ensure_positive(system, lambda)?;
        Ok(Self {
            totals,
            epsilon: 0.0,
            delta: 0.0,
            observed: 0,
        })
    }

    pub fn observe(&mut self, counts: MatchCounts) {
        self.observed += 1;
        let p1 = occurrence_probability(counts.task, self.totals.task).unwrap_or(0.0);
        let p2 = occurrence_probability(counts.notask, self.totals.notask).unwrap_or(0.0);
        match log_ratio(p1, p2) {
            Some(ratio) => self.epsilon = self.epsilon.max(ratio),
            None => self.delta = self.delta.max(p1).max(p2),
        }
    }

    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn estimate(&self) -> Estimate {
        Estimate::Defined {
            epsilon: self.epsilon,
            delta: self.delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc() -> PrivacyAccumulator {
        PrivacyAccumulator::new(WindowTotals { task: 100, notask: 400 }, "1", 0.1).unwrap()
    }

    #[test]
    fn one_sided_match_raises_delta() {
        let mut acc = acc();
        acc.observe(MatchCounts { task: 5, notask: 0 });
        assert_eq!(acc.estimate(), Estimate::Defined { epsilon: 0.0, delta: 0.05 });
        acc.observe(MatchCounts { task: 0, notask: 8 });
        assert_eq!(acc.estimate().delta(), Some(0.05));
        assert_eq!(acc.observed(), 2);
    }

    #[test]
    fn two_sided_match_raises_epsilon() {
        let mut acc = acc();
        // p1 = 0.1, p2 = 0.05
        acc.observe(MatchCounts { task: 10, notask: 20 });
        let eps = acc.estimate().epsilon().unwrap();
        assert!((eps - 2f64.ln()).abs() < 1e-12);
        // equal probabilities never lower the maximum
        acc.observe(MatchCounts { task: 1, notask: 4 });
        assert!((acc.estimate().epsilon().unwrap() - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn unmatched_sample_changes_nothing() {
        let mut acc = acc();
        acc.observe(MatchCounts::default());
        assert_eq!(acc.estimate(), Estimate::Defined { epsilon: 0.0, delta: 0.0 });
    }

    #[test]
    fn zero_total_is_rejected() {
        assert!(PrivacyAccumulator::new(WindowTotals { task: 0, notask: 1 }, "1", 0.1).is_err());
    }

    #[test]
    fn probabilities_are_clamped() {
        let mut acc = acc();
        acc.observe(MatchCounts { task: 500, notask: 0 });
        assert_eq!(acc.estimate().delta(), Some(1.0));
    }

    #[test]
    fn undefined_serializes_reason() {
        let json = serde_json::to_string(&Estimate::Undefined {
            reason: "zero".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"undefined","reason":"zero"}"#);
    }
}
