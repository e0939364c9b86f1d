// Configuration for sequential motion segmentation
//
// Immutable, passed by value into the scanner. Every field is named after
// the parameter it controls; nothing is threaded positionally.

use crate::error::{Result, SegmentError};
use crate::regression::TestMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which sides of a window are forced through a neighbouring line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntersectionMode {
    /// Independent fits everywhere
    #[default]
    None,
    /// Each segment (except the first of a super-segment) starts on the
    /// last fitted point of the previous segment
    ForceLeft,
    /// As `ForceLeft`, and the lookahead window is also forced through the
    /// left segment's prediction at the window start
    ForceLeftAndRight,
}

impl IntersectionMode {
    pub fn force_left(self) -> bool {
        matches!(self, Self::ForceLeft | Self::ForceLeftAndRight)
    }

    pub fn force_right(self) -> bool {
        matches!(self, Self::ForceLeftAndRight)
    }
}

/// What the gap-aware outer loop does when a super-segment fails to scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log, keep the super-segment as one unfitted segment, continue
    #[default]
    Skip,
    /// Return the error to the caller
    Abort,
}

/// Configuration for the segment window scanner and its outer loop
///
/// # Example
/// ```
/// use motionseg::segmentation::SegmentationConfig;
///
/// let config = SegmentationConfig::default();
/// assert_eq!(config.window_size, 10);
/// assert_eq!(config.significance_level, 0.01);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Width of the right lookahead window
    pub window_size: usize,

    /// Width of the first left window of every new segment; `None` follows
    /// `window_size`
    pub init_segment_size: Option<usize>,

    /// Stride by which the left segment grows between tests
    pub step: usize,

    /// Significance level (alpha) below which a slope change is a regime change
    ///
    /// - 0.01 (default)
    /// - 1e-4 for controller speed, 1e-5 for head speed in the reaching protocol
    pub significance_level: f64,

    /// Time delta above which adjacent samples are separated by a capture pause
    pub gap_threshold: f64,

    /// Continuity constraints between adjacent fits
    pub intersection: IntersectionMode,

    /// Coefficients compared by the divergence test
    pub test_mode: TestMode,

    /// Outer-loop behaviour on a failed super-segment
    pub on_failure: FailurePolicy,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            init_segment_size: None,
            step: 1,
            significance_level: 0.01,
            gap_threshold: 1.0,
            intersection: IntersectionMode::None,
            test_mode: TestMode::Slope,
            on_failure: FailurePolicy::Skip,
        }
    }
}

impl SegmentationConfig {
    /// Width of the first left window of every new segment
    pub fn initial_window(&self) -> usize {
        self.init_segment_size.unwrap_or(self.window_size)
    }

    /// Hand-held controller speed in the reaching protocol
    pub fn controller() -> Self {
        Self {
            significance_level: 1e-4,
            ..Self::default()
        }
    }

    /// Head speed: slower, noisier, needs a wider window and stricter alpha
    pub fn head() -> Self {
        Self {
            window_size: 20,
            significance_level: 1e-5,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.window_size < 2 {
            return Err(format!(
                "window_size must be >= 2 to fit a line, got {}",
                self.window_size
            ));
        }

        if let Some(init) = self.init_segment_size.filter(|&init| init < 2) {
            return Err(format!(
                "init_segment_size must be >= 2 to fit a line, got {}",
                init
            ));
        }

        if self.step == 0 {
            return Err("step must be >= 1".to_string());
        }

        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            ));
        }

        if !(self.gap_threshold.is_finite() && self.gap_threshold > 0.0) {
            return Err(format!(
                "gap_threshold must be positive and finite, got {}",
                self.gap_threshold
            ));
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| SegmentError::InvalidConfig(e.to_string()))?;
        config.validate().map_err(SegmentError::InvalidConfig)?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
