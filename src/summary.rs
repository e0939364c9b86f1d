//! Segment summarizer
//!
//! One row per segment that is long enough to have been tested (at least
//! `window_size - 1` samples). Segment order is preserved; `index` is the
//! position in the full segment list, so discarded segments leave holes.
//!
//! Descriptive statistics run through trueno's SIMD vector primitives and
//! aprender's quantiles, in f32.

use crate::error::{Result, SegmentError};
use crate::regression::{compare, fit_line, median, FittedLine, Intersection};
use crate::segmentation::{Segment, SegmentationConfig};
use crate::series::Series;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trueno::Vector;

/// Report row for one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    /// Position of the segment in the segmentation result
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub n: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
    /// max - min
    pub range: f64,
    pub slope: Option<f64>,
    pub slope_t: Option<f64>,
    pub residual_std: Option<f64>,
    /// Look-back test of the segment onset against the previous segment's trend
    pub onset_pvalue: Option<f64>,
}

struct Descriptive {
    mean: f32,
    median: f32,
    min: f32,
    max: f32,
    std: f32,
}

/// Summarize the segments of one series
///
/// `segments` are in global indices, as produced by
/// [`segment_series`](crate::segmentation::segment_series).
///
/// # Errors
/// `MalformedInput` if a segment reaches past the end of the series.
pub fn summarize(
    series: &Series,
    segments: &[Segment],
    config: &SegmentationConfig,
) -> Result<Vec<SegmentSummary>> {
    let min_len = config.window_size.saturating_sub(1).max(1);
    let mut rows = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        if segment.end > series.len() || segment.start > segment.end {
            return Err(SegmentError::MalformedInput(format!(
                "segment {}..{} outside series of {} samples",
                segment.start,
                segment.end,
                series.len()
            )));
        }
        if segment.len() < min_len {
            debug!(index, len = segment.len(), "segment too short to report");
            continue;
        }

        let time = &series.time()[segment.start..segment.end];
        let values = &series.value()[segment.start..segment.end];
        let stats = describe(values)?;

        let start_time = time[0];
        let end_time = time[time.len() - 1];
        let line = segment.line.as_ref();

        let previous = index
            .checked_sub(1)
            .map(|k| &segments[k])
            .filter(|prev| prev.super_segment == segment.super_segment);
        let onset_pvalue = previous
            .and_then(|prev| prev.line.as_ref())
            .filter(|_| line.is_some())
            .and_then(|prev_line| onset_test(series, segment, prev_line, config));

        rows.push(SegmentSummary {
            index,
            start: segment.start,
            end: segment.end,
            n: segment.len(),
            start_time,
            end_time,
            duration: end_time - start_time,
            mean: f64::from(stats.mean),
            median: f64::from(stats.median),
            min: f64::from(stats.min),
            max: f64::from(stats.max),
            std: f64::from(stats.std),
            range: f64::from(stats.max - stats.min),
            slope: line.map(|l| l.slope),
            slope_t: line.and_then(FittedLine::slope_t),
            residual_std: line.map(FittedLine::residual_std),
            onset_pvalue,
        });
    }

    Ok(rows)
}

/// Refit the first `window_size` samples through the previous line at the
/// segment start and compare against the previous slope
fn onset_test(
    series: &Series,
    segment: &Segment,
    previous: &FittedLine,
    config: &SegmentationConfig,
) -> Option<f64> {
    let width = config.window_size.min(segment.len());
    let start_time = series.time()[segment.start];
    let anchor = Intersection::Forced {
        time: start_time,
        value: previous.predict(start_time),
    };

    let result = fit_line(
        series.time(),
        series.value(),
        segment.start..segment.start + width,
        anchor,
    )
    .and_then(|onset| compare(&onset, previous, config.test_mode));

    match result {
        Ok(test) => Some(test.pvalue),
        Err(e) => {
            debug!(start = segment.start, "onset test skipped: {}", e);
            None
        }
    }
}

fn describe(values: &[f64]) -> Result<Descriptive> {
    let samples: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    let v = Vector::from_slice(&samples);

    let stat_error = |what: &str, e: String| {
        SegmentError::MalformedInput(format!("failed to compute {}: {}", what, e))
    };

    Ok(Descriptive {
        mean: v.mean().map_err(|e| stat_error("mean", e.to_string()))?,
        median: median(&v)?,
        min: v.min().map_err(|e| stat_error("min", e.to_string()))?,
        max: v.max().map_err(|e| stat_error("max", e.to_string()))?,
        std: v.stddev().map_err(|e| stat_error("std", e.to_string()))?,
    })
}
