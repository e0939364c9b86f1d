//! Gap-aware outer loop
//!
//! Splits a series at capture pauses and scans each super-segment on its
//! own. Nothing carries across a gap: every super-segment starts with an
//! unforced segment.

use crate::error::{Result, SegmentError};
use crate::segmentation::breakpoints::Breakpoints;
use crate::segmentation::config::{FailurePolicy, SegmentationConfig};
use crate::segmentation::scanner::{scan, Segment};
use crate::series::Series;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A super-segment the scanner failed on and that was kept as one unfitted segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSuperSegment {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub reason: String,
}

/// Result of segmenting a full series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub breakpoints: Breakpoints,

    /// Segments in global indices, partitioning `0..series.len()`
    pub segments: Vec<Segment>,

    pub skipped: Vec<SkippedSuperSegment>,
}

/// Segment a full series
///
/// Breakpoints always include every gap boundary, independent of the
/// statistical test.
///
/// # Errors
/// - `InvalidConfig` for a configuration that fails validation
/// - the scanner's error for a failed super-segment under `FailurePolicy::Abort`
///
/// # Example
/// ```
/// use motionseg::segmentation::{segment_series, SegmentationConfig};
/// use motionseg::series::Series;
///
/// // Two 12-sample captures separated by a 5 s pause
/// let time: Vec<f64> = (0..24)
///     .map(|i| if i < 12 { i as f64 * 0.01 } else { 5.0 + i as f64 * 0.01 })
///     .collect();
/// let value: Vec<f64> = time.iter().map(|t| 0.2 * t).collect();
/// let series = Series::new(time, value).unwrap();
///
/// let result = segment_series(&series, &SegmentationConfig::default()).unwrap();
/// assert_eq!(result.breakpoints.as_slice(), &[0, 12, 24]);
/// ```
pub fn segment_series(series: &Series, config: &SegmentationConfig) -> Result<Segmentation> {
    config.validate().map_err(SegmentError::InvalidConfig)?;

    let mut segments = Vec::new();
    let mut skipped = Vec::new();

    for (index, range) in series.super_segments(config.gap_threshold).into_iter().enumerate() {
        let time = &series.time()[range.clone()];
        let value = &series.value()[range.clone()];

        match scan(time, value, config) {
            Ok(local) => {
                debug!(
                    super_segment = index,
                    start = range.start,
                    end = range.end,
                    segments = local.len(),
                    "scanned super-segment"
                );
                segments.extend(local.into_iter().map(|s| Segment {
                    start: s.start + range.start,
                    end: s.end + range.start,
                    super_segment: index,
                    ..s
                }));
            }
            Err(e) => match config.on_failure {
                FailurePolicy::Abort => return Err(e),
                FailurePolicy::Skip => {
                    warn!(
                        super_segment = index,
                        start = range.start,
                        end = range.end,
                        "skipping super-segment: {}",
                        e
                    );
                    segments.push(Segment {
                        start: range.start,
                        end: range.end,
                        line: None,
                        super_segment: index,
                    });
                    skipped.push(SkippedSuperSegment {
                        index,
                        start: range.start,
                        end: range.end,
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    Ok(Segmentation {
        breakpoints: Breakpoints::from_segments(&segments, series.len()),
        segments,
        skipped,
    })
}
