//! Error taxonomy for segmentation
//!
//! `InsufficientData` is recoverable (the scanner stops early and keeps a
//! shorter final segment). `DegenerateFit` is surfaced to the caller, which
//! decides whether to skip the super-segment or abort. `MalformedInput` is
//! raised before any scan starts.

use thiserror::Error;

/// Errors produced by the segmentation pipeline
#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("insufficient data: need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("degenerate fit: {reason}")]
    DegenerateFit { reason: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SegmentError {
    /// True for errors the scanner treats as "stop here, keep what we have"
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, SegmentError::InsufficientData { .. })
    }
}

pub type Result<T> = std::result::Result<T, SegmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message() {
        let err = SegmentError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 2 points, got 1"
        );
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_degenerate_fit_not_recoverable() {
        let err = SegmentError::DegenerateFit {
            reason: "zero variance".to_string(),
        };
        assert!(!err.is_insufficient_data());
        assert!(err.to_string().contains("zero variance"));
    }
}
