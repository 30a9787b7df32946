//! Parallel padding of a whole trace.
//!
//! The trace is cut into overlapping chunks that are padded on a rayon pool,
//! each with its own seeded RNG, and joined back in chunk order.

use ned_common::{Error, Result};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::debug;

use super::generator::{generate_chunk, PaddingParams};
use crate::rng::StreamSeed;
use crate::trace::{EventTrace, PaddedTrace};

/// Cut `events` into chunks of `chunk_size` pairs.
///
/// Each chunk holds at most `chunk_size + 1` events and shares its last
/// event with the first event of the next chunk. A trace with fewer than
/// two events has no chunks.
pub fn split_chunks(events: &[u64], chunk_size: usize) -> Vec<&[u64]> {
    let n = events.len();
    let step = chunk_size.max(1);
    (0..n.saturating_sub(1))
        .step_by(step)
        .map(|start| &events[start..(start + step + 1).min(n)])
        .collect()
}

/// Pad a whole genuine trace on `pool`.
///
/// Chunk `i` draws from `seed.derive(i)`, so seeded runs produce the same
/// padded trace for any pool size.
pub fn pad_trace(
    system: &str,
    trace: &EventTrace,
    params: &PaddingParams,
    chunk_size: usize,
    seed: StreamSeed,
    pool: &ThreadPool,
) -> Result<PaddedTrace> {
    let Some(last) = trace.last() else {
        return Err(Error::EmptyTrace {
            system: system.to_string(),
            reason: "no genuine events to pad".to_string(),
        });
    };

    let chunks = split_chunks(trace.events(), chunk_size);
    debug!(
        system,
        lambda = params.lambda,
        chunks = chunks.len(),
        "padding trace"
    );

    let outputs: Vec<Vec<u64>> = pool.install(|| {
        chunks
            .par_iter()
            .enumerate()
            .map(|(idx, chunk)| {
                let mut rng = seed.derive(idx as u64).rng();
                generate_chunk(chunk, params, &mut rng)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let total = outputs.iter().map(Vec::len).sum::<usize>() + 1;
    let mut events = Vec::with_capacity(total);
    for output in outputs {
        events.extend(output);
    }
    events.push(last);

    PaddedTrace::new(events, trace.len()).map_err(|e| e.in_system(system))
}
