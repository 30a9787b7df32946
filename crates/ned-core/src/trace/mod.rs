//! Trace data structures: genuine events, interactions and padded traces.

pub mod event_trace;
pub mod padded;

pub use event_trace::{EventTrace, InteractionSet};
pub use padded::PaddedTrace;

use ned_common::{Error, Result};

/// Scale raw store timestamps into precision units.
fn scale_all(raw: &[f64], precision: f64, what: &str) -> Result<Vec<u64>> {
    raw.iter()
        .map(|&ts| {
            ned_math::to_units(ts, precision).ok_or_else(|| {
                Error::Source(format!("{} timestamp {} is not a valid time", what, ts))
            })
        })
        .collect()
}

/// Check that a unit sequence never decreases.
fn check_non_decreasing(values: &[u64], what: &str) -> Result<()> {
    if let Some(pos) = values.windows(2).position(|w| w[1] < w[0]) {
        return Err(Error::TraceOrdering {
            system: None,
            detail: format!(
                "{} {} at index {} follows {}",
                what,
                values[pos + 1],
                pos + 1,
                values[pos]
            ),
        });
    }
    Ok(())
}
