// Ordinary least squares over an index range
//
// Two model forms:
// - free:   y = a + b·x            (df = n - 2)
// - forced: y - v0 = b·(x - t0)    (df = n - 1), reported back in original
//           coordinates as intercept = v0 - b·t0
//
// Regressor sums are taken relative to the window's first sample and then
// centred, so absolute clocks (epoch seconds) keep their sub-millisecond
// spacing.

use crate::error::{Result, SegmentError};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Point a fitted line is constrained to pass through
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intersection {
    /// Ordinary intercept-bearing fit
    #[default]
    None,
    /// Fit constrained through `(time, value)`
    Forced { time: f64, value: f64 },
}

/// A straight line fitted over one contiguous index range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLine {
    pub slope: f64,

    /// Intercept in original coordinates (value at x = 0)
    pub intercept: f64,

    /// Standard error of the slope
    pub slope_se: f64,

    /// Standard error of the intercept (free fits only)
    pub intercept_se: Option<f64>,

    /// Covariance of (intercept, slope) estimates (free fits only)
    pub intercept_slope_cov: Option<f64>,

    /// Residual variance, RSS / df (0 when df = 0)
    pub residual_variance: f64,

    /// Number of samples in the fit
    pub n: usize,

    /// Residual degrees of freedom
    pub df: usize,

    /// Anchor the line was forced through, if any
    pub intersection: Intersection,

    /// Fitted values over the range, in order
    pub fitted: Vec<f64>,
}

impl FittedLine {
    /// Evaluate the line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn residual_std(&self) -> f64 {
        self.residual_variance.sqrt()
    }

    pub fn is_forced(&self) -> bool {
        matches!(self.intersection, Intersection::Forced { .. })
    }

    /// Last fitted value, the anchor for a following force-left segment
    pub fn last_fitted(&self) -> Option<f64> {
        self.fitted.last().copied()
    }

    /// Covariance matrix of the (intercept, slope) estimates
    ///
    /// For a forced line the intercept is `value - slope·time`, so its
    /// variance and covariance follow from the slope variance alone.
    pub fn covariance(&self) -> [[f64; 2]; 2] {
        let var_b = self.slope_se * self.slope_se;
        match (self.intercept_se, self.intercept_slope_cov, self.intersection) {
            (Some(se_a), Some(cov), _) => [[se_a * se_a, cov], [cov, var_b]],
            (_, _, Intersection::Forced { time, .. }) => {
                let cov = -time * var_b;
                [[time * time * var_b, cov], [cov, var_b]]
            }
            _ => [[0.0, 0.0], [0.0, var_b]],
        }
    }

    /// t-statistic of the slope against zero, if the standard error is non-zero
    pub fn slope_t(&self) -> Option<f64> {
        (self.slope_se > 0.0).then(|| self.slope / self.slope_se)
    }
}

/// Fit a line to `y[range]` against `x[range]`
///
/// # Errors
/// - `MalformedInput` if `x` and `y` differ in length or `range` is out of bounds
/// - `InsufficientData` if the range holds fewer than 2 points
/// - `DegenerateFit` if the regressor has zero variance over the range
///
/// # Example
/// ```
/// use motionseg::regression::{fit_line, Intersection};
///
/// let x = [0.0, 1.0, 2.0, 3.0];
/// let y = [1.0, 3.0, 5.0, 7.0];
/// let line = fit_line(&x, &y, 0..4, Intersection::None).unwrap();
/// assert!((line.slope - 2.0).abs() < 1e-12);
/// assert!((line.intercept - 1.0).abs() < 1e-12);
/// ```
pub fn fit_line(
    x: &[f64],
    y: &[f64],
    range: Range<usize>,
    intersection: Intersection,
) -> Result<FittedLine> {
    if x.len() != y.len() {
        return Err(SegmentError::MalformedInput(format!(
            "regressor has {} samples but response has {}",
            x.len(),
            y.len()
        )));
    }
    if range.start > range.end || range.end > x.len() {
        return Err(SegmentError::MalformedInput(format!(
            "range {}..{} out of bounds for {} samples",
            range.start,
            range.end,
            x.len()
        )));
    }

    let n = range.len();
    if n < 2 {
        return Err(SegmentError::InsufficientData { needed: 2, got: n });
    }

    let xs = &x[range.clone()];
    let ys = &y[range];

    let line = match intersection {
        Intersection::None => fit_free(xs, ys)?,
        Intersection::Forced { time, value } => fit_forced(xs, ys, time, value)?,
    };

    if !line.slope.is_finite() || !line.intercept.is_finite() || !line.slope_se.is_finite() {
        return Err(SegmentError::DegenerateFit {
            reason: format!("non-finite estimate over {} samples", n),
        });
    }

    Ok(line)
}

fn fit_free(xs: &[f64], ys: &[f64]) -> Result<FittedLine> {
    let n = xs.len();
    let nf = n as f64;
    let origin = xs[0];
    let u_mean = xs.iter().map(|&xi| xi - origin).sum::<f64>() / nf;
    let x_mean = origin + u_mean;
    let y_mean = ys.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in xs.iter().zip(ys) {
        let dx = (xi - origin) - u_mean;
        sxx += dx * dx;
        sxy += dx * (yi - y_mean);
    }

    if sxx == 0.0 || !sxx.is_finite() {
        return Err(SegmentError::DegenerateFit {
            reason: format!("zero regressor variance over {} samples", n),
        });
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let fitted: Vec<f64> = xs
        .iter()
        .map(|&xi| y_mean + slope * ((xi - origin) - u_mean))
        .collect();
    let rss = residual_sum_of_squares(ys, &fitted);

    let df = n - 2;
    let residual_variance = if df > 0 { rss / df as f64 } else { 0.0 };
    let slope_var = residual_variance / sxx;
    let intercept_var = residual_variance * (1.0 / nf + x_mean * x_mean / sxx);

    Ok(FittedLine {
        slope,
        intercept,
        slope_se: slope_var.sqrt(),
        intercept_se: Some(intercept_var.sqrt()),
        intercept_slope_cov: Some(-x_mean * slope_var),
        residual_variance,
        n,
        df,
        intersection: Intersection::None,
        fitted,
    })
}

fn fit_forced(xs: &[f64], ys: &[f64], t0: f64, v0: f64) -> Result<FittedLine> {
    let n = xs.len();

    let mut suu = 0.0;
    let mut suw = 0.0;
    for (&xi, &yi) in xs.iter().zip(ys) {
        let u = xi - t0;
        suu += u * u;
        suw += u * (yi - v0);
    }

    if suu == 0.0 {
        return Err(SegmentError::DegenerateFit {
            reason: format!(
                "all {} samples coincide with the forcing point x={}",
                n, t0
            ),
        });
    }

    let slope = suw / suu;
    let fitted: Vec<f64> = xs.iter().map(|&xi| v0 + slope * (xi - t0)).collect();
    let rss = residual_sum_of_squares(ys, &fitted);

    let df = n - 1;
    let residual_variance = rss / df as f64;

    Ok(FittedLine {
        slope,
        intercept: v0 - slope * t0,
        slope_se: (residual_variance / suu).sqrt(),
        intercept_se: None,
        intercept_slope_cov: None,
        residual_variance,
        n,
        df,
        intersection: Intersection::Forced {
            time: t0,
            value: v0,
        },
        fitted,
    })
}

fn residual_sum_of_squares(ys: &[f64], fitted: &[f64]) -> f64 {
    ys.iter()
        .zip(fitted)
        .map(|(&yi, &fi)| (yi - fi) * (yi - fi))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_fit_exact_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let line = fit_line(&x, &y, 0..10, Intersection::None).unwrap();

        assert!((line.slope - 2.0).abs() < 1e-10);
        assert!((line.intercept - 1.0).abs() < 1e-10);
        assert!(line.residual_std() < 1e-10);
        assert_eq!(line.df, 8);
        assert_eq!(line.fitted.len(), 10);
    }

    #[test]
    fn test_free_fit_two_points_has_defined_df() {
        let x = [3.0, 4.0];
        let y = [7.0, 9.0];
        let line = fit_line(&x, &y, 0..2, Intersection::None).unwrap();

        assert!((line.slope - 2.0).abs() < 1e-12);
        assert!((line.intercept - 1.0).abs() < 1e-12);
        assert_eq!(line.df, 0);
        assert_eq!(line.residual_variance, 0.0);
        assert!(!line.slope_se.is_nan());
    }

    #[test]
    fn test_fit_subrange_only_uses_range() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [100.0, 1.0, 2.0, 3.0, -50.0];
        let line = fit_line(&x, &y, 1..4, Intersection::None).unwrap();
        assert!((line.slope - 1.0).abs() < 1e-12);
        assert!(line.intercept.abs() < 1e-12);
    }

    #[test]
    fn test_forced_fit_passes_through_anchor() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.1, 2.9, 4.2, 4.8];
        let anchor = Intersection::Forced {
            time: 0.5,
            value: 1.0,
        };
        let line = fit_line(&x, &y, 0..4, anchor).unwrap();

        assert!((line.predict(0.5) - 1.0).abs() < 1e-12);
        assert!(line.is_forced());
        assert_eq!(line.df, 3);
        assert!(line.intercept_se.is_none());
    }

    #[test]
    fn test_forced_fit_exact_slope() {
        let x = [1.0, 2.0, 3.0];
        let y = [5.0, 8.0, 11.0];
        let line = fit_line(
            &x,
            &y,
            0..3,
            Intersection::Forced {
                time: 0.0,
                value: 2.0,
            },
        )
        .unwrap();
        assert!((line.slope - 3.0).abs() < 1e-12);
        assert!(line.residual_std() < 1e-12);
    }

    #[test]
    fn test_forced_covariance_follows_slope_variance() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.1, 2.9, 4.2, 4.8];
        let line = fit_line(
            &x,
            &y,
            0..4,
            Intersection::Forced {
                time: 0.5,
                value: 1.0,
            },
        )
        .unwrap();
        let [[var_a, cov], [_, var_b]] = line.covariance();
        assert!((var_a - 0.25 * var_b).abs() < 1e-15);
        assert!((cov + 0.5 * var_b).abs() < 1e-15);
    }

    #[test]
    fn test_epoch_timestamps_fit_like_relative_ones() {
        let relative: Vec<f64> = (0..10).map(|i| i as f64 * 0.01).collect();
        let epoch: Vec<f64> = relative.iter().map(|t| t + 1.7e9).collect();
        let y: Vec<f64> = relative
            .iter()
            .enumerate()
            .map(|(i, t)| 0.4 * t + if i % 2 == 0 { 0.002 } else { -0.002 })
            .collect();

        let near = fit_line(&relative, &y, 0..10, Intersection::None).unwrap();
        let far = fit_line(&epoch, &y, 0..10, Intersection::None).unwrap();

        assert!((near.slope - far.slope).abs() < 1e-3, "slope {}", far.slope);
        assert!((near.slope_se - far.slope_se).abs() < 1e-3);
        assert!((near.predict(relative[5]) - far.predict(epoch[5])).abs() < 1e-4);
        for (a, b) in near.fitted.iter().zip(&far.fitted) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let err = fit_line(&[1.0], &[1.0], 0..1, Intersection::None).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_duplicate_timestamps_are_degenerate() {
        let x = [2.0, 2.0, 2.0];
        let y = [1.0, 2.0, 3.0];
        let err = fit_line(&x, &y, 0..3, Intersection::None).unwrap_err();
        assert!(matches!(err, SegmentError::DegenerateFit { .. }));
    }

    #[test]
    fn test_forced_at_coincident_point_is_degenerate() {
        let x = [2.0, 2.0];
        let y = [1.0, 2.0];
        let err = fit_line(
            &x,
            &y,
            0..2,
            Intersection::Forced {
                time: 2.0,
                value: 0.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, SegmentError::DegenerateFit { .. }));
    }

    #[test]
    fn test_range_out_of_bounds() {
        let err = fit_line(&[0.0, 1.0], &[0.0, 1.0], 0..3, Intersection::None).unwrap_err();
        assert!(matches!(err, SegmentError::MalformedInput(_)));
    }

    #[test]
    fn test_intersection_json_shape() {
        let json = serde_json::to_string(&Intersection::Forced {
            time: 1.0,
            value: 2.0,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"forced","time":1.0,"value":2.0}"#);
    }
}
