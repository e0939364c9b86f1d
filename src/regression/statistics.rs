// Coefficient hypothesis tests for fitted lines
//
// The segmentation scan asks one question over and over: does the slope of
// the lookahead window differ from the slope of the growing left segment?
//
// - `test_slope`: t = (b - b0) / se(b), two-sided Student-t tail with the
//   tested line's residual degrees of freedom
// - `test_slope_difference`: Welch-style two-sample version, both slope
//   standard errors, Welch-Satterthwaite degrees of freedom
// - `test_joint`: Wald statistic on (intercept, slope) with the summed
//   covariance of both fits, upper tail of F(2, df). A forced line has only
//   its slope free, which reduces to F(1, df) = t²
//
// Tail probabilities go through the regularized incomplete beta function:
//   P(|T| > t)  = I_{df/(df+t²)}(df/2, 1/2)
//   P(F > f)    = I_{d2/(d2+d1·f)}(d2/2, d1/2)

use crate::error::{Result, SegmentError};
use crate::regression::fit::FittedLine;
use aprender::stats::DescriptiveStats;
use serde::{Deserialize, Serialize};
use trueno::Vector;

/// Which coefficients the divergence test compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    /// Slope only (recommended)
    #[default]
    Slope,
    /// Slope and intercept jointly
    SlopeAndIntercept,
}

/// Result of a coefficient test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalTest {
    /// t-statistic (slope mode) or F-statistic (joint mode)
    pub statistic: f64,

    /// Two-sided p-value in [0, 1]
    pub pvalue: f64,

    /// Degrees of freedom of the reference distribution (Welch df rounded down)
    pub df: usize,
}

/// Test the slope of `line` against a fixed reference slope
///
/// # Example
/// ```
/// use motionseg::regression::{fit_line, test_slope, Intersection};
///
/// let x: Vec<f64> = (0..12).map(|i| i as f64).collect();
/// let y: Vec<f64> = x.iter().enumerate()
///     .map(|(i, v)| 0.5 * v + if i % 2 == 0 { 0.1 } else { -0.1 })
///     .collect();
/// let line = fit_line(&x, &y, 0..12, Intersection::None).unwrap();
///
/// assert!(test_slope(&line, 0.5).unwrap().pvalue > 0.05);
/// assert!(test_slope(&line, 3.0).unwrap().pvalue < 1e-6);
/// ```
pub fn test_slope(line: &FittedLine, reference_slope: f64) -> Result<StatisticalTest> {
    require_df(line)?;

    let diff = line.slope - reference_slope;
    let statistic = if line.slope_se > 0.0 {
        diff / line.slope_se
    } else if diff == 0.0 {
        0.0
    } else {
        f64::INFINITY.copysign(diff)
    };

    Ok(StatisticalTest {
        statistic,
        pvalue: student_t_two_sided(statistic, line.df as f64),
        df: line.df,
    })
}

/// Welch-style two-sample test of the slope of `line` against the slope of `reference`
///
/// Both standard errors enter the statistic; degrees of freedom follow
/// Welch-Satterthwaite. A reference without residual degrees of freedom
/// contributes no variance.
pub fn test_slope_difference(line: &FittedLine, reference: &FittedLine) -> Result<StatisticalTest> {
    require_df(line)?;

    let var_line = line.slope_se * line.slope_se;
    let var_ref = if reference.df > 0 {
        reference.slope_se * reference.slope_se
    } else {
        0.0
    };
    let var = var_line + var_ref;
    let diff = line.slope - reference.slope;

    if var == 0.0 {
        let exact = diff == 0.0;
        return Ok(StatisticalTest {
            statistic: if exact { 0.0 } else { f64::INFINITY.copysign(diff) },
            pvalue: if exact { 1.0 } else { 0.0 },
            df: line.df,
        });
    }

    let df = if var_ref == 0.0 {
        line.df as f64
    } else if var_line == 0.0 {
        reference.df as f64
    } else {
        let denom = var_line * var_line / line.df as f64
            + var_ref * var_ref / reference.df as f64;
        var * var / denom
    };

    let statistic = diff / var.sqrt();
    Ok(StatisticalTest {
        statistic,
        pvalue: student_t_two_sided(statistic, df),
        df: df.floor().max(1.0) as usize,
    })
}

/// Test slope and intercept of `line` jointly against `reference`
///
/// Wald statistic on the coefficient differences with the summed
/// covariance of both fits, referred to F(2, df) where df is the smaller of
/// the two residual degrees of freedom. A forced `line` has a single free
/// coefficient and falls back to the slope-difference test (F = t²).
pub fn test_joint(line: &FittedLine, reference: &FittedLine) -> Result<StatisticalTest> {
    require_df(line)?;

    if line.is_forced() {
        let t = test_slope_difference(line, reference)?;
        return Ok(StatisticalTest {
            statistic: t.statistic * t.statistic,
            ..t
        });
    }

    let [[var_a, cov], [_, var_b]] = line.covariance();
    let (ref_var_a, ref_cov, ref_var_b) = if reference.df > 0 {
        let [[a, c], [_, b]] = reference.covariance();
        (a, c, b)
    } else {
        (0.0, 0.0, 0.0)
    };
    let var_a = var_a + ref_var_a;
    let var_b = var_b + ref_var_b;
    let cov = cov + ref_cov;

    let da = line.intercept - reference.intercept;
    let db = line.slope - reference.slope;
    let df = if reference.df > 0 {
        line.df.min(reference.df)
    } else {
        line.df
    };

    if var_a == 0.0 && var_b == 0.0 {
        let exact = da == 0.0 && db == 0.0;
        return Ok(StatisticalTest {
            statistic: if exact { 0.0 } else { f64::INFINITY },
            pvalue: if exact { 1.0 } else { 0.0 },
            df,
        });
    }

    let det = var_a * var_b - cov * cov;
    if det <= 0.0 || !det.is_finite() {
        return Err(SegmentError::DegenerateFit {
            reason: "singular coefficient covariance".to_string(),
        });
    }

    // d' V^-1 d for the 2x2 covariance, divided by the number of restrictions
    let wald = (da * da * var_b - 2.0 * da * db * cov + db * db * var_a) / det;
    let statistic = wald / 2.0;

    Ok(StatisticalTest {
        statistic,
        pvalue: f_upper_tail(statistic, 2.0, df as f64),
        df,
    })
}

/// Dispatch on `mode`: compare `line` against the slope (or full line) of `reference`
pub fn compare(line: &FittedLine, reference: &FittedLine, mode: TestMode) -> Result<StatisticalTest> {
    match mode {
        TestMode::Slope => test_slope_difference(line, reference),
        TestMode::SlopeAndIntercept => test_joint(line, reference),
    }
}

/// Median through aprender's `DescriptiveStats::quantile(0.5)` (R-7 method)
pub fn median(vector: &Vector<f32>) -> Result<f32> {
    DescriptiveStats::new(vector)
        .quantile(0.5)
        .map_err(|e| SegmentError::MalformedInput(format!("failed to compute median: {}", e)))
}

fn require_df(line: &FittedLine) -> Result<()> {
    if line.df == 0 {
        let needed = if line.is_forced() { 2 } else { 3 };
        return Err(SegmentError::InsufficientData {
            needed,
            got: line.n,
        });
    }
    Ok(())
}

/// Two-sided tail probability P(|T| >= |t|) for Student's t with `df` degrees of freedom
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    let x = df / (df + t * t);
    regularized_incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Upper tail probability P(F >= f) for the F(d1, d2) distribution
pub fn f_upper_tail(f: f64, d1: f64, d2: f64) -> f64 {
    if f.is_nan() || d1 <= 0.0 || d2 <= 0.0 {
        return f64::NAN;
    }
    if f <= 0.0 {
        return 1.0;
    }
    if f.is_infinite() {
        return 0.0;
    }
    let x = d2 / (d2 + d1 * f);
    regularized_incomplete_beta(d2 / 2.0, d1 / 2.0, x).clamp(0.0, 1.0)
}

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function (Lanczos approximation, x > 0)
fn ln_gamma(x: f64) -> f64 {
    use std::f64::consts::PI;

    if x < 0.5 {
        // Reflection formula
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let series = LANCZOS_COEFFS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEFFS[0], |acc, (i, &c)| acc + c / (x + i as f64));

    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// Regularized incomplete beta I_x(a, b)
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fastest below the mean
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for the incomplete beta (modified Lentz)
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        // Odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    h
}
