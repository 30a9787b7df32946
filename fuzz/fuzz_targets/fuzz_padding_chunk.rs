//! Fuzz target for single-chunk dummy generation.
//!
//! Sorted input must produce a non-decreasing chunk that keeps every
//! genuine event but the last; unsorted input must be rejected.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ned_core::padding::{generate_chunk, PaddingParams};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Arbitrary)]
struct Input {
    events: Vec<u32>,
    lambda: f64,
    outage_threshold: u16,
    seed: u64,
    sort: bool,
}

fuzz_target!(|input: Input| {
    let mut events: Vec<u64> = input.events.iter().map(|&e| u64::from(e)).collect();
    if input.sort {
        events.sort_unstable();
    }
    let params = PaddingParams {
        lambda: input.lambda.clamp(-1.0, 2.0),
        outage_threshold: u64::from(input.outage_threshold),
        precision: 1.0,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(input.seed);
    let sorted = events.windows(2).all(|w| w[0] <= w[1]);

    match generate_chunk(&events, &params, &mut rng) {
        Ok(output) => {
            assert!(sorted);
            assert!(output.windows(2).all(|w| w[0] <= w[1]));
            if let Some(&first) = events.first() {
                assert_eq!(output.first(), Some(&first));
                assert!(output.len() >= events.len() - 1);
            }
        }
        Err(_) => assert!(!sorted),
    }
});
