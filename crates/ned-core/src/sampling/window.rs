//! Window construction and outage checks for sampled starts.

use std::sync::Arc;

use crate::trace::PaddedTrace;

/// One accepted observation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Window start, in units.
    pub start: u64,
    /// First delta is `first_event - start`, then consecutive inter-arrivals.
    pub deltas: Arc<[u64]>,
    /// An interaction lies in `[start, start + duration]`.
    pub task: bool,
}

/// Fill `buf` with the deltas of the window `[start, start + duration]`.
///
/// Returns the index range of the padded events inside the window.
pub fn build_window(
    trace: &PaddedTrace,
    start: u64,
    duration: u64,
    buf: &mut Vec<u64>,
) -> (usize, usize) {
    buf.clear();
    let first = trace.lower_bound(start);
    let end = trace.upper_bound(start.saturating_add(duration));
    if first < end {
        let events = trace.events();
        buf.push(events[first] - start);
        buf.extend_from_slice(&trace.inter_arrivals()[first..end - 1]);
    }
    (first, end)
}

/// Whether the gap before either window boundary is an outage.
pub fn crosses_outage(trace: &PaddedTrace, first: usize, end: usize, outage: u64) -> bool {
    let n = trace.len();
    let ia = trace.inter_arrivals();
    [first, end]
        .into_iter()
        .any(|idx| idx > 0 && idx < n && ia[idx - 1] > outage)
}
