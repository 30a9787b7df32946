//! Bisection over sorted slices.
//!
//! Both functions assume `sorted` is non-decreasing and run in O(log n).

/// Index of the first element `>= value` (`sorted.len()` if none).
#[inline]
pub fn lower_bound(sorted: &[u64], value: u64) -> usize {
    sorted.partition_point(|&x| x < value)
}

/// Index of the first element `> value` (`sorted.len()` if none).
#[inline]
pub fn upper_bound(sorted: &[u64], value: u64) -> usize {
    sorted.partition_point(|&x| x <= value)
}

/// Whether any element lies in the closed interval `[lo, hi]`.
#[inline]
pub fn any_within(sorted: &[u64], lo: u64, hi: u64) -> bool {
    if lo > hi {
        return false;
    }
    let idx = lower_bound(sorted, lo);
    idx < sorted.len() && sorted[idx] <= hi
}
