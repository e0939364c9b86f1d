//! Motion signal series (time, value)
//!
//! A `Series` is validated once on construction and is read-only for the
//! rest of the pipeline: equal-length columns, finite values, strictly
//! increasing time.

use crate::error::{Result, SegmentError};
use std::ops::Range;
use std::path::Path;

/// Ordered (time, value) samples of one signal (speed, distance, acceleration)
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    time: Vec<f64>,
    value: Vec<f64>,
}

impl Series {
    /// Build a series, rejecting malformed input before any scan starts
    pub fn new(time: Vec<f64>, value: Vec<f64>) -> Result<Self> {
        if time.len() != value.len() {
            return Err(SegmentError::MalformedInput(format!(
                "time has {} samples but value has {}",
                time.len(),
                value.len()
            )));
        }
        if time.is_empty() {
            return Err(SegmentError::MalformedInput("series is empty".to_string()));
        }
        if let Some(k) = time.iter().chain(value.iter()).position(|v| !v.is_finite()) {
            let (column, idx) = if k < time.len() {
                ("time", k)
            } else {
                ("value", k - time.len())
            };
            return Err(SegmentError::MalformedInput(format!(
                "non-finite {} at index {}",
                column, idx
            )));
        }
        if let Some(k) = time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SegmentError::MalformedInput(format!(
                "time not strictly increasing at index {} ({} -> {})",
                k + 1,
                time[k],
                time[k + 1]
            )));
        }

        Ok(Self { time, value })
    }

    /// Same timestamps, replaced values (used by outlier cleaning)
    pub fn with_values(&self, value: Vec<f64>) -> Result<Self> {
        Self::new(self.time.clone(), value)
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn value(&self) -> &[f64] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Split into super-segments at capture pauses
    ///
    /// A new super-segment starts at `k` whenever
    /// `time[k] - time[k-1] > gap_threshold`. The returned ranges partition
    /// `0..len()` in order.
    pub fn super_segments(&self, gap_threshold: f64) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for k in 1..self.time.len() {
            if self.time[k] - self.time[k - 1] > gap_threshold {
                ranges.push(start..k);
                start = k;
            }
        }
        ranges.push(start..self.time.len());
        ranges
    }

    /// Parse two numeric columns `time,value`
    ///
    /// Blank lines and `#` comments are skipped. A first line that does not
    /// parse as numbers is treated as a header.
    pub fn from_csv_str(input: &str) -> Result<Self> {
        let mut time = Vec::new();
        let mut value = Vec::new();

        for (line_no, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split(',').map(str::trim);
            let (Some(t), Some(v)) = (fields.next(), fields.next()) else {
                return Err(SegmentError::MalformedInput(format!(
                    "line {}: expected two columns",
                    line_no + 1
                )));
            };

            match (t.parse::<f64>(), v.parse::<f64>()) {
                (Ok(t), Ok(v)) => {
                    time.push(t);
                    value.push(v);
                }
                _ if time.is_empty() && line_no == first_data_line(input) => continue,
                _ => {
                    return Err(SegmentError::MalformedInput(format!(
                        "line {}: cannot parse '{}'",
                        line_no + 1,
                        line
                    )));
                }
            }
        }

        Self::new(time, value)
    }

    /// Read a `time,value` file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_csv_str(&content)
    }
}

/// Index of the first line that is neither blank nor a comment
fn first_data_line(input: &str) -> usize {
    input
        .lines()
        .position(|l| {
            let l = l.trim();
            !l.is_empty() && !l.starts_with('#')
        })
        .unwrap_or(0)
}
