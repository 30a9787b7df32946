//! Dummy event generation for one chunk of a genuine trace.
//!
//! Dummies follow a Poisson process: exponential increments with rate
//! `lambda * precision` are drawn inside every gap that is not an outage.

use ned_common::{Error, Result};
use rand::Rng;
use rand_distr::{Distribution, Exp};

/// Parameters of one padding run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddingParams {
    /// Dummy events per second. Negative disables padding.
    pub lambda: f64,
    /// Gap in units above which no dummies are inserted.
    pub outage_threshold: u64,
    /// Seconds per unit.
    pub precision: f64,
}

impl PaddingParams {
    /// Dummy events per unit, or `None` when nothing is inserted.
    pub fn rate(&self) -> Option<f64> {
        let rate = self.lambda * self.precision;
        (rate.is_finite() && rate > 0.0).then_some(rate)
    }

    pub fn is_passthrough(&self) -> bool {
        self.lambda < 0.0
    }
}

/// Pad one chunk of genuine events.
///
/// The output starts with `chunk[0]`, contains every genuine event of the
/// chunk except the last one (which the next chunk starts with), and is
/// strictly increasing between genuine events.
pub fn generate_chunk<R: Rng + ?Sized>(
    chunk: &[u64],
    params: &PaddingParams,
    rng: &mut R,
) -> Result<Vec<u64>> {
    let Some(&first) = chunk.first() else {
        return Ok(Vec::new());
    };

    if let Some(pos) = chunk.windows(2).position(|w| w[1] < w[0]) {
        return Err(Error::TraceOrdering {
            system: None,
            detail: format!(
                "chunk event {} at offset {} follows {}",
                chunk[pos + 1],
                pos + 1,
                chunk[pos]
            ),
        });
    }

    if params.is_passthrough() {
        return Ok(chunk[..chunk.len() - 1].to_vec());
    }

    let exp = match params.rate() {
        Some(rate) => Some(Exp::new(rate).map_err(|e| {
            Error::Config(format!("invalid dummy rate {}: {}", params.lambda, e))
        })?),
        None => None,
    };

    let mut output = Vec::with_capacity(chunk.len() * 2);
    output.push(first);

    for pair in chunk.windows(2) {
        let (last, next) = (pair[0], pair[1]);
        if let Some(exp) = &exp {
            if next - last <= params.outage_threshold {
                insert_dummies(&mut output, last, next, exp, rng);
            }
        }
        output.push(next);
    }

    output.pop();
    Ok(output)
}

/// Append dummy events in `(last, next)` to `output`.
///
/// Positions accumulate in `f64` and are floored to units; a floored
/// candidate that does not advance past the previous output is dropped.
fn insert_dummies<R: Rng + ?Sized>(
    output: &mut Vec<u64>,
    last: u64,
    next: u64,
    exp: &Exp<f64>,
    rng: &mut R,
) {
    let mut position = last as f64;
    let limit = next as f64;
    loop {
        position += exp.sample(rng);
        let candidate = position.floor();
        if candidate >= limit {
            break;
        }
        let candidate = candidate as u64;
        if output.last().is_some_and(|&prev| candidate > prev) {
            output.push(candidate);
        }
    }
}
