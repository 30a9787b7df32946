//! Probability ratios for the epsilon bound.

/// Occurrence probability `count / total`, clamped to `[0, 1]`.
///
/// Returns `None` when `total` is zero.
#[inline]
pub fn occurrence_probability(count: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some((count as f64 / total as f64).clamp(0.0, 1.0))
}

/// `ln(max(p1, p2) / min(p1, p2))` for two strictly positive probabilities.
///
/// Always `>= 0`. Returns `None` if either side is zero or not finite.
#[inline]
pub fn log_ratio(p1: f64, p2: f64) -> Option<f64> {
    if !(p1 > 0.0 && p2 > 0.0) || !p1.is_finite() || !p2.is_finite() {
        return None;
    }
    let (hi, lo) = if p1 >= p2 { (p1, p2) } else { (p2, p1) };
    Some((hi / lo).ln().max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_handles_zero_total() {
        assert_eq!(occurrence_probability(3, 0), None);
        assert_eq!(occurrence_probability(0, 10), Some(0.0));
        assert_eq!(occurrence_probability(5, 10), Some(0.5));
    }

    #[test]
    fn probability_is_clamped() {
        assert_eq!(occurrence_probability(30, 10), Some(1.0));
    }

    #[test]
    fn log_ratio_symmetric() {
        let a = log_ratio(0.2, 0.05).unwrap();
        let b = log_ratio(0.05, 0.2).unwrap();
        assert!((a - b).abs() < 1e-15);
        assert!((a - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn log_ratio_rejects_zero() {
        assert_eq!(log_ratio(0.0, 0.5), None);
        assert_eq!(log_ratio(0.5, 0.0), None);
        assert_eq!(log_ratio(0.3, 0.3), Some(0.0));
    }
}
