//! Precision policies.
//!
//! Derived geometry is compared after rounding so floating-point jitter from
//! repeated projection round trips never looks like a real change.

/// Canonicalize a floating-point value for deterministic comparison.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Rounds `v` to `decimals` decimal places.
pub fn round_to(v: f64, decimals: u32) -> f64 {
    let p = 10f64.powi(decimals as i32);
    canonical_f64((v * p).round() / p)
}

/// Division that yields `fallback` instead of an infinity or NaN.
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den == 0.0 || !den.is_finite() {
        return fallback;
    }
    let q = num / den;
    if q.is_finite() { q } else { fallback }
}

pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

#[cfg(test)]
mod tests {
    use super::{approx_eq, canonical_f64, round_to, safe_div};

    #[test]
    fn canonicalizes_negative_zero() {
        assert_eq!(canonical_f64(-0.0), 0.0);
        assert_eq!(canonical_f64(0.0), 0.0);
        assert!(canonical_f64(f64::NAN).is_nan());
    }

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(round_to(12.345_678, 3), 12.346);
        assert_eq!(round_to(-0.000_1, 3), 0.0);
        assert_eq!(round_to(179.999_999_9, 3), 180.0);
    }

    #[test]
    fn safe_div_guards_zero() {
        assert_eq!(safe_div(1.0, 0.0, 7.0), 7.0);
        assert_eq!(safe_div(1.0, 4.0, 7.0), 0.25);
        assert!(approx_eq(safe_div(1.0, 3.0, 0.0), 0.333, 1e-3));
    }
}
