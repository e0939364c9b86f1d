//! Segment window scanner
//!
//! Sequential changepoint search over one super-segment. The left segment
//! grows from `[i, i + initial_window)` one `step` at a time; after every
//! step a fixed-width lookahead window `[j, j + window_size)` is fitted and
//! its slope tested against the left segment's slope.
//!
//! A break is accepted one step *after* the evidence peaks: when the current
//! p-value is significant but larger than the previous step's, the previous
//! left fit becomes the finished segment and the previous `j` the breakpoint.
//! As long as the p-value keeps falling the left segment keeps growing.

use crate::error::{Result, SegmentError};
use crate::regression::{compare, fit_line, FittedLine, Intersection};
use crate::segmentation::config::SegmentationConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A contiguous half-open index range `[start, end)` with its fitted line
///
/// `line` is `None` when the range could not be fitted (fewer than two
/// samples, or a super-segment skipped after a failed scan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub line: Option<FittedLine>,
    /// Index of the super-segment this segment belongs to
    pub super_segment: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Scanner state between two transitions
#[derive(Debug)]
enum ScanState {
    /// Fit the left segment over `[i, j)`
    GrowingLeft,
    /// Fit the lookahead window `[j, j + window_size)` and test it
    TestingRight { left: FittedLine },
    /// The previous step's left fit is final, ending at `end`
    Accepted { line: FittedLine, end: usize },
    /// Not enough data left to keep testing
    Exhausted,
}

struct Scanner<'a> {
    x: &'a [f64],
    y: &'a [f64],
    config: &'a SegmentationConfig,
    /// Start of the segment under construction
    i: usize,
    /// End of the left segment / start of the lookahead window
    j: usize,
    /// p-value of the previous step
    q: f64,
    /// Left fit of the previous step and the `j` it was fitted with
    prev: Option<(FittedLine, usize)>,
    /// Anchor for the next left fit (force-left mode)
    left_anchor: Intersection,
    segments: Vec<Segment>,
}

/// Segment one super-segment
///
/// `x` is the regressor (time) and `y` the signal. Returned segments are in
/// local indices, partition `0..x.len()` and have `super_segment == 0`.
///
/// # Errors
/// - `InvalidConfig` / `MalformedInput` for bad parameters or arrays
/// - `DegenerateFit` if a window has zero regressor variance
///
/// # Example
/// ```
/// use motionseg::segmentation::{scan, SegmentationConfig};
///
/// let x: Vec<f64> = (0..40).map(|i| i as f64 * 0.01).collect();
/// let y: Vec<f64> = x.iter().map(|t| 1.0 + 0.5 * t).collect();
/// let segments = scan(&x, &y, &SegmentationConfig::default()).unwrap();
/// assert_eq!(segments.first().unwrap().start, 0);
/// assert_eq!(segments.last().unwrap().end, 40);
/// ```
pub fn scan(x: &[f64], y: &[f64], config: &SegmentationConfig) -> Result<Vec<Segment>> {
    config.validate().map_err(SegmentError::InvalidConfig)?;
    if x.len() != y.len() {
        return Err(SegmentError::MalformedInput(format!(
            "regressor has {} samples but signal has {}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Ok(Vec::new());
    }

    Scanner {
        x,
        y,
        config,
        i: 0,
        j: config.initial_window(),
        q: 1.0,
        prev: None,
        left_anchor: Intersection::None,
        segments: Vec::new(),
    }
    .run()
}

impl Scanner<'_> {
    fn run(mut self) -> Result<Vec<Segment>> {
        let mut state = ScanState::GrowingLeft;
        loop {
            state = match state {
                ScanState::GrowingLeft => self.grow_left()?,
                ScanState::TestingRight { left } => self.test_right(left)?,
                ScanState::Accepted { line, end } => self.accept(line, end),
                ScanState::Exhausted => break,
            };
        }
        self.finish_tail()?;
        Ok(self.segments)
    }

    fn grow_left(&mut self) -> Result<ScanState> {
        if self.j + self.config.window_size > self.x.len() {
            return Ok(ScanState::Exhausted);
        }

        match fit_line(self.x, self.y, self.i..self.j, self.left_anchor) {
            Ok(left) => Ok(ScanState::TestingRight { left }),
            Err(e) if e.is_insufficient_data() => {
                debug!(start = self.i, end = self.j, "left segment too short: {}", e);
                Ok(ScanState::Exhausted)
            }
            Err(e) => Err(e),
        }
    }

    /// Anchor of the lookahead window: the left line at the window start
    fn right_anchor(&self, left: &FittedLine) -> Intersection {
        if self.config.intersection.force_right() {
            let time = self.x[self.j];
            Intersection::Forced {
                time,
                value: left.predict(time),
            }
        } else {
            Intersection::None
        }
    }

    fn test_right(&mut self, left: FittedLine) -> Result<ScanState> {
        let j = self.j;
        let window = j..j + self.config.window_size;
        let pvalue = match fit_line(self.x, self.y, window, self.right_anchor(&left))
            .and_then(|right| compare(&right, &left, self.config.test_mode))
        {
            Ok(test) => test.pvalue,
            Err(e) if e.is_insufficient_data() => {
                debug!(start = j, "lookahead window too short: {}", e);
                return Ok(ScanState::Exhausted);
            }
            Err(e) => return Err(e),
        };

        if pvalue < self.config.significance_level && pvalue > self.q {
            if let Some((line, end)) = self.prev.take() {
                return Ok(ScanState::Accepted { line, end });
            }
        }

        self.q = pvalue;
        self.prev = Some((left, j));
        self.j += self.config.step;
        Ok(ScanState::GrowingLeft)
    }

    fn accept(&mut self, line: FittedLine, end: usize) -> ScanState {
        debug!(start = self.i, end, slope = line.slope, "accepted segment");

        if self.config.intersection.force_left() {
            if let Some(value) = line.last_fitted() {
                self.left_anchor = Intersection::Forced {
                    time: self.x[end - 1],
                    value,
                };
            }
        }

        self.segments.push(Segment {
            start: self.i,
            end,
            line: Some(line),
            super_segment: 0,
        });

        self.i = end;
        self.j = end + self.config.initial_window();
        self.q = 1.0;
        self.prev = None;
        ScanState::GrowingLeft
    }

    /// Fit `[i, len)` as the final segment, without a lookahead test
    fn finish_tail(&mut self) -> Result<()> {
        let n = self.x.len();
        if self.i >= n {
            return Ok(());
        }

        let line = match fit_line(self.x, self.y, self.i..n, self.left_anchor) {
            Ok(line) => Some(line),
            Err(e) if e.is_insufficient_data() => {
                debug!(start = self.i, end = n, "tail kept unfitted: {}", e);
                None
            }
            Err(e) => return Err(e),
        };

        self.segments.push(Segment {
            start: self.i,
            end: n,
            line,
            super_segment: 0,
        });
        Ok(())
    }
}
