//! Padded trace index.

use ned_common::Result;
use ned_math::{lower_bound, upper_bound};

use super::check_non_decreasing;

/// Genuine plus dummy events of one lambda run, with inter-arrival times.
///
/// `inter_arrivals[i] == events[i + 1] - events[i]`. Built once per lambda
/// and shared read-only with the matcher workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedTrace {
    events: Vec<u64>,
    inter_arrivals: Vec<u64>,
    genuine_len: usize,
}

impl PaddedTrace {
    /// Wrap a concatenated padded sequence. `genuine_len` is the number of
    /// genuine events it was generated from.
    pub fn new(events: Vec<u64>, genuine_len: usize) -> Result<Self> {
        check_non_decreasing(&events, "padded event")?;
        let inter_arrivals = events.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(Self {
            events,
            inter_arrivals,
            genuine_len,
        })
    }

    pub fn events(&self) -> &[u64] {
        &self.events
    }

    pub fn inter_arrivals(&self) -> &[u64] {
        &self.inter_arrivals
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

    pub fn genuine_len(&self) -> usize {
        self.genuine_len
    }

    /// Index of the first event `>= ts`.
    #[inline]
    pub fn lower_bound(&self, ts: u64) -> usize {
        lower_bound(&self.events, ts)
    }

    /// Index of the first event `> ts`.
    #[inline]
    pub fn upper_bound(&self, ts: u64) -> usize {
        upper_bound(&self.events, ts)
    }

    pub fn dummy_count(&self) -> usize {
        self.events.len().saturating_sub(self.genuine_len)
    }

    /// `|padded| / |genuine| - 1`.
    pub fn traffic_increase(&self) -> f64 {
        if self.genuine_len == 0 {
            return 0.0;
        }
        self.events.len() as f64 / self.genuine_len as f64 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inter_arrivals_align_with_events() {
        let trace = PaddedTrace::new(vec![0, 2, 5, 5, 9], 3).unwrap();
        assert_eq!(trace.inter_arrivals(), &[2, 3, 0, 4]);
        assert_eq!(trace.dummy_count(), 2);
        assert!((trace.traffic_increase() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn bounds() {
        let trace = PaddedTrace::new(vec![0, 2, 5, 9], 4).unwrap();
        assert_eq!(trace.lower_bound(5), 2);
        assert_eq!(trace.upper_bound(5), 3);
        assert_eq!(trace.lower_bound(10), 4);
        assert_eq!(trace.traffic_increase(), 0.0);
    }

    #[test]
    fn single_event_has_no_inter_arrivals() {
        let trace = PaddedTrace::new(vec![7], 1).unwrap();
        assert!(trace.inter_arrivals().is_empty());
        assert_eq!(trace.first(), trace.last());
    }

    #[test]
    fn rejects_unordered() {
        assert!(PaddedTrace::new(vec![3, 1], 2).is_err());
    }
}
