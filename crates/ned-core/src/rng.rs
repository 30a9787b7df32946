//! Random stream derivation.
//!
//! A seeded study derives one independent stream per system, lambda, phase
//! and chunk from the study seed, so a run is reproducible regardless of
//! how the worker pool schedules chunks. An unseeded study draws every
//! stream from OS entropy.

use ned_math::{counter_rng_seed, labeled_seed};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seed of one random stream, or a request for fresh entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSeed {
    Fixed(u64),
    Entropy,
}

impl StreamSeed {
    pub fn from_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => StreamSeed::Fixed(seed),
            None => StreamSeed::Entropy,
        }
    }

    /// Child stream identified by a counter (lambda index, chunk index).
    pub fn derive(self, counter: u64) -> Self {
        match self {
            StreamSeed::Fixed(base) => StreamSeed::Fixed(counter_rng_seed(base, counter)),
            StreamSeed::Entropy => StreamSeed::Entropy,
        }
    }

    /// Child stream identified by a label (system id, phase name).
    pub fn derive_label(self, label: &str) -> Self {
        match self {
            StreamSeed::Fixed(base) => StreamSeed::Fixed(labeled_seed(base, label)),
            StreamSeed::Entropy => StreamSeed::Entropy,
        }
    }

    pub fn rng(self) -> ChaCha8Rng {
        match self {
            StreamSeed::Fixed(seed) => ChaCha8Rng::seed_from_u64(seed),
            StreamSeed::Entropy => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }

    pub fn is_fixed(self) -> bool {
        matches!(self, StreamSeed::Fixed(_))
    }
}
