//! No-mock tests for dummy traffic generation over chunked traces.

use ned_core::padding::{pad_trace, split_chunks, PaddingParams};
use ned_core::pool::build_pool;
use ned_core::rng::StreamSeed;
use ned_core::trace::{EventTrace, PaddedTrace};
use proptest::prelude::*;

const OUTAGE: u64 = 500;

fn params(lambda: f64) -> PaddingParams {
    PaddingParams {
        lambda,
        outage_threshold: OUTAGE,
        precision: 1.0,
    }
}

fn trace_from_gaps(gaps: &[u64]) -> EventTrace {
    let mut t = 0;
    let mut events = vec![t];
    for gap in gaps {
        t += gap;
        events.push(t);
    }
    EventTrace::new(events).unwrap()
}

fn pad(trace: &EventTrace, lambda: f64, chunk_size: usize, workers: usize, seed: u64) -> PaddedTrace {
    let pool = build_pool(Some(workers), "padding-test").unwrap();
    pad_trace(
        "test",
        trace,
        &params(lambda),
        chunk_size,
        StreamSeed::Fixed(seed),
        &pool,
    )
    .unwrap()
}

/// Genuine events appear in order inside the padded trace.
fn keeps_genuine(genuine: &[u64], padded: &[u64]) -> bool {
    let mut j = 0;
    for &event in padded {
        if j < genuine.len() && event == genuine[j] {
            j += 1;
        }
    }
    j == genuine.len()
}

fn gap_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        8 => 0u64..60,
        1 => 600u64..2_000,
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn padded_trace_is_ordered_and_keeps_genuine(
        gaps in prop::collection::vec(gap_strategy(), 1..300),
        chunk_size in 1usize..40,
        seed in any::<u64>(),
    ) {
        let trace = trace_from_gaps(&gaps);
        let padded = pad(&trace, 0.2, chunk_size, 2, seed);

        prop_assert!(padded.events().windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(padded.first(), trace.first());
        prop_assert_eq!(padded.last(), trace.last());
        prop_assert!(keeps_genuine(trace.events(), padded.events()));
        prop_assert_eq!(padded.genuine_len(), trace.len());
        prop_assert_eq!(padded.dummy_count(), padded.len() - trace.len());
    }

    #[test]
    fn outage_gaps_stay_empty(
        gaps in prop::collection::vec(gap_strategy(), 1..200),
        seed in any::<u64>(),
    ) {
        let trace = trace_from_gaps(&gaps);
        let padded = pad(&trace, 1.0, 16, 2, seed);
        for pair in trace.events().windows(2) {
            if pair[1] - pair[0] > OUTAGE {
                let lo = padded.upper_bound(pair[0]);
                let hi = padded.lower_bound(pair[1]);
                prop_assert_eq!(lo, hi, "dummies inside outage ({}, {})", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn seeded_padding_ignores_pool_size(
        gaps in prop::collection::vec(gap_strategy(), 1..200),
        chunk_size in 1usize..30,
        seed in any::<u64>(),
    ) {
        let trace = trace_from_gaps(&gaps);
        let one = pad(&trace, 0.3, chunk_size, 1, seed);
        let four = pad(&trace, 0.3, chunk_size, 4, seed);
        prop_assert_eq!(one, four);
    }

    #[test]
    fn passthrough_returns_genuine(
        gaps in prop::collection::vec(gap_strategy(), 1..200),
        chunk_size in 1usize..30,
    ) {
        let trace = trace_from_gaps(&gaps);
        let padded = pad(&trace, -1.0, chunk_size, 2, 0);
        prop_assert_eq!(padded.events(), trace.events());
        prop_assert_eq!(padded.dummy_count(), 0);
    }

    #[test]
    fn chunks_cover_every_pair(
        len in 0usize..200,
        chunk_size in 1usize..50,
    ) {
        let events: Vec<u64> = (0..len as u64).collect();
        let chunks = split_chunks(&events, chunk_size);
        let pairs: usize = chunks.iter().map(|c| c.len() - 1).sum();
        prop_assert_eq!(pairs, len.saturating_sub(1));
        for pair in chunks.windows(2) {
            prop_assert_eq!(pair[0].last(), pair[1].first());
        }
    }
}

#[test]
fn outage_tail_gets_no_dummies() {
    let trace = EventTrace::new(vec![0, 5, 12, 13, 1_000_000]).unwrap();
    let padded = pad(&trace, 5.0, 2, 2, 11);
    let events = padded.events();
    let between = |lo: u64, hi: u64| events.iter().filter(|&&e| e > lo && e < hi).count();

    assert!(between(0, 5) > 0);
    assert!(between(5, 12) > 0);
    // no whole unit lies strictly inside (12, 13)
    assert_eq!(between(12, 13), 0);
    assert_eq!(between(13, 1_000_000), 0);
    assert_eq!(events[events.len() - 2], 13);
    assert_eq!(events[events.len() - 1], 1_000_000);
    assert!(keeps_genuine(trace.events(), events));
}

#[test]
fn different_seeds_differ() {
    let trace = trace_from_gaps(&[50; 400]);
    let a = pad(&trace, 0.5, 64, 2, 1);
    let b = pad(&trace, 0.5, 64, 2, 2);
    assert_ne!(a.events(), b.events());
}

#[test]
fn unordered_trace_never_reaches_padding() {
    assert!(EventTrace::new(vec![0, 20, 10]).is_err());
    let pool = build_pool(Some(1), "padding-test").unwrap();
    let empty = EventTrace::new(Vec::new()).unwrap();
    assert!(pad_trace("t", &empty, &params(0.1), 1, StreamSeed::Fixed(0), &pool).is_err());
}
