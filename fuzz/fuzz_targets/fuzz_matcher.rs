//! Fuzz target for window matching.
//!
//! Arbitrary traces and samples must be counted without panicking, and a
//! window drawn from the trace must match at least itself.

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ned_core::matching::Matcher;
use ned_core::sampling::{build_window, crosses_outage};
use ned_core::trace::{InteractionSet, PaddedTrace};

#[derive(Debug, Arbitrary)]
struct Input {
    gaps: Vec<u8>,
    interactions: Vec<u16>,
    sample: Vec<u8>,
    start: u16,
    duration: u8,
    outage: u8,
}

fuzz_target!(|input: Input| {
    let mut t = 0u64;
    let mut events = vec![t];
    for gap in &input.gaps {
        t += u64::from(*gap);
        events.push(t);
    }
    let n = events.len();
    let Ok(trace) = PaddedTrace::new(events, n) else {
        return;
    };
    let interactions = InteractionSet::new(input.interactions.iter().map(|&i| u64::from(i)).collect())
        .unwrap_or_default();
    let duration = u64::from(input.duration);
    let outage = u64::from(input.outage).max(1);
    let trace = Arc::new(trace);
    let matcher = Matcher::new(Arc::clone(&trace), Arc::new(interactions), duration, outage);

    let sample: Vec<u64> = input.sample.iter().map(|&d| u64::from(d)).collect();
    let _ = matcher.count(&sample);

    let mut window = Vec::new();
    let (first, end) = build_window(&trace, u64::from(input.start), duration, &mut window);
    if !window.is_empty() && first > 0 && end < trace.len() && !crosses_outage(&trace, first, end, outage) {
        let counts = matcher.count(&window);
        assert!(counts.task + counts.notask >= 1);
    }
});
