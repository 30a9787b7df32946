//! Conversion between raw store timestamps and integer precision units.

/// Scale a raw timestamp (seconds) to integer units of `precision` seconds.
///
/// Returns `None` for negative, non-finite or non-representable values.
#[inline]
pub fn to_units(raw: f64, precision: f64) -> Option<u64> {
    if !(precision > 0.0) || !raw.is_finite() {
        return None;
    }
    let scaled = (raw / precision).round();
    if scaled < 0.0 || scaled >= u64::MAX as f64 {
        return None;
    }
    Some(scaled as u64)
}

/// Window duration in units: `round(secs / precision)`, at least 1.
#[inline]
pub fn duration_units(secs: f64, precision: f64) -> u64 {
    to_units(secs, precision).unwrap_or(0).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_by_precision() {
        assert_eq!(to_units(1_352_588_400.0, 1.0), Some(1_352_588_400));
        assert_eq!(to_units(12.3456, 0.001), Some(12_346));
        assert_eq!(to_units(0.4, 1.0), Some(0));
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(to_units(-1.0, 1.0), None);
        assert_eq!(to_units(f64::NAN, 1.0), None);
        assert_eq!(to_units(1.0, 0.0), None);
    }

    #[test]
    fn duration_in_units() {
        assert_eq!(duration_units(10.0, 1.0), 10);
        assert_eq!(duration_units(10.0, 0.001), 10_000);
        assert_eq!(duration_units(0.0001, 1.0), 1);
    }
}
