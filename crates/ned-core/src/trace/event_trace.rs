//! Genuine event traces and interaction sets in precision units.

use ned_common::Result;
use ned_math::any_within;

use super::{check_non_decreasing, scale_all};

/// Genuine event timestamps of one system, in precision units.
///
/// Non-decreasing; equal timestamps are allowed and kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTrace {
    events: Vec<u64>,
}

impl EventTrace {
    pub fn new(events: Vec<u64>) -> Result<Self> {
        check_non_decreasing(&events, "event")?;
        Ok(Self { events })
    }

    /// Scale raw store timestamps (seconds) by `precision` and validate.
    pub fn from_raw(raw: &[f64], precision: f64) -> Result<Self> {
        Self::new(scale_all(raw, precision, "event")?)
    }

    pub fn events(&self) -> &[u64] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> Option<u64> {
        self.events.first().copied()
    }

    pub fn last(&self) -> Option<u64> {
        self.events.last().copied()
    }
}

/// Ordered, deduplicated interaction timestamps, in precision units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionSet {
    timestamps: Vec<u64>,
}

impl InteractionSet {
    /// Build from non-decreasing timestamps; repeats are collapsed.
    pub fn new(mut timestamps: Vec<u64>) -> Result<Self> {
        check_non_decreasing(&timestamps, "interaction")?;
        timestamps.dedup();
        Ok(Self { timestamps })
    }

    pub fn from_raw(raw: &[f64], precision: f64) -> Result<Self> {
        Self::new(scale_all(raw, precision, "interaction")?)
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Whether any interaction lies in `[lo, hi]`.
    #[inline]
    pub fn any_within(&self, lo: u64, hi: u64) -> bool {
        any_within(&self.timestamps, lo, hi)
    }
}
