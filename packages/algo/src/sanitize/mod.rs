//! Numeric guards shared by the scoring modules.
//!
//! Every metric is defined for every reachable input: empty denominators
//! yield 0 and non-finite values are replaced before they reach a profile.

/// Replace a non-finite value with 0
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Clamp into [0, 100], NaN becomes 0
pub fn clamp_percent(x: f64) -> f64 {
    finite_or_zero(x).clamp(0.0, 100.0)
}

/// Clamp into [-100, 100], NaN becomes 0
pub fn clamp_signed_percent(x: f64) -> f64 {
    finite_or_zero(x).clamp(-100.0, 100.0)
}

/// `num / den`, or 0 when the denominator is empty
pub fn safe_ratio(num: f64, den: f64) -> f64 {
    if den <= 0.0 || !den.is_finite() || !num.is_finite() {
        0.0
    } else {
        num / den
    }
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, 0 for fewer than two values
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Clean seconds reported by a client: non-finite or negative becomes 0
pub fn sanitize_seconds(x: f64) -> f64 {
    finite_or_zero(x).max(0.0)
}
