//! Exact sub-pattern matching of samples against the padded trace.

pub mod matcher;
pub mod totals;

pub use matcher::{MatchCounts, Matcher};
pub use totals::{count_window_totals, WindowTotals};
