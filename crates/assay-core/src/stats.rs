//! Replicate statistics: mean and relative standard deviation.

// ── Mean ──────────────────────────────────────────────────────────────────────

/// Arithmetic mean of the present values, or `None` when every value is missing.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

// ── Standard deviation ────────────────────────────────────────────────────────

/// Sample standard deviation (n − 1 denominator) of the present values.
///
/// Returns `None` when fewer than two values are present.
pub fn sample_std_dev(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let n = present.len();
    if n < 2 {
        return None;
    }
    let avg = present.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = present.iter().map(|v| (v - avg).powi(2)).sum();
    Some((sum_sq / (n as f64 - 1.0)).sqrt())
}

/// Relative standard deviation as a percentage: `std_dev / mean × 100`.
///
/// `None` for groups of a single replicate, when the statistic is undefined,
/// or when the mean is zero.
pub fn relative_std_dev(values: &[Option<f64>]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sd = sample_std_dev(values)?;
    let avg = mean(values)?;
    let rsd = sd / avg * 100.0;
    rsd.is_finite().then_some(rsd)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
