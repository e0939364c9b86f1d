//! Hampel outlier cleaning
//!
//! Each sample is compared against the median of its neighbourhood
//! `[k - window, k + window]`. Samples further than `n_sigma` scaled MADs
//! from that median are replaced by it. Cleaning runs per super-segment so
//! a neighbourhood never spans a capture pause.
//!
//! Medians go through the same f32 aprender quantile as the segment
//! summaries, so replaced samples carry f32 precision.

use crate::error::{Result, SegmentError};
use crate::regression::median;
use crate::series::Series;
use tracing::debug;
use trueno::Vector;

/// MAD to standard deviation for normally distributed data
const MAD_SCALE: f64 = 1.4826;

/// Clean one contiguous run of samples
///
/// # Example
/// ```
/// use motionseg::noise_filter::hampel;
///
/// let values = [1.0, 1.1, 0.9, 25.0, 1.0, 1.05, 0.95];
/// let cleaned = hampel(&values, 3, 2.0).unwrap();
/// assert_eq!(cleaned[3], 1.0);
/// assert_eq!(cleaned[0], 1.0);
/// ```
pub fn hampel(values: &[f64], window: usize, n_sigma: f64) -> Result<Vec<f64>> {
    let n = values.len();
    let mut out = values.to_vec();
    let mut replaced = 0usize;

    for k in 0..n {
        let lo = k.saturating_sub(window);
        let hi = (k + window + 1).min(n);
        let neighbourhood: Vec<f32> = values[lo..hi].iter().map(|&v| v as f32).collect();

        let med = median(&Vector::from_slice(&neighbourhood))?;
        let deviations: Vec<f32> = neighbourhood.iter().map(|v| (v - med).abs()).collect();
        let sigma = MAD_SCALE * f64::from(median(&Vector::from_slice(&deviations))?);

        let med = f64::from(med);
        if sigma > 0.0 && (values[k] - med).abs() > n_sigma * sigma {
            out[k] = med;
            replaced += 1;
        }
    }

    if replaced > 0 {
        debug!(replaced, samples = n, "hampel replaced outliers");
    }
    Ok(out)
}

/// Clean a whole series, one super-segment at a time
///
/// # Errors
/// `InvalidConfig` for a zero window or a non-positive `n_sigma`.
pub fn clean(series: &Series, window: usize, n_sigma: f64, gap_threshold: f64) -> Result<Series> {
    if window == 0 {
        return Err(SegmentError::InvalidConfig(
            "hampel window must be >= 1".to_string(),
        ));
    }
    if !(n_sigma.is_finite() && n_sigma > 0.0) {
        return Err(SegmentError::InvalidConfig(format!(
            "hampel n_sigma must be positive, got {}",
            n_sigma
        )));
    }

    let mut cleaned = Vec::with_capacity(series.len());
    for range in series.super_segments(gap_threshold) {
        cleaned.extend(hampel(&series.value()[range], window, n_sigma)?);
    }
    series.with_values(cleaned)
}
