//! JSON output format for segmentation runs

use crate::batch::{BatchOutcome, FileReport};
use crate::segmentation::{Breakpoints, SkippedSuperSegment};
use crate::summary::SegmentSummary;
use serde::{Deserialize, Serialize};

/// Segmentation result of one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFileReport {
    pub file: String,
    pub samples: usize,
    pub breakpoints: Breakpoints,
    /// Super-segments kept unfitted after a failed scan
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped: Vec<SkippedSuperSegment>,
    pub segments: Vec<SegmentSummary>,
}

/// A file that could not be processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFailure {
    pub file: String,
    pub error: String,
}

/// Complete JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    pub version: String,
    pub format: String,
    pub files: Vec<JsonFileReport>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<JsonFailure>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "motionseg-json-v1".to_string(),
            files: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn add_report(&mut self, report: &FileReport) {
        self.files.push(JsonFileReport {
            file: report.path.display().to_string(),
            samples: report.samples,
            breakpoints: report.segmentation.breakpoints.clone(),
            skipped: report.segmentation.skipped.clone(),
            segments: report.summary.clone(),
        });
    }

    /// Collect every report and failure of a batch, in input order
    pub fn from_outcome(outcome: &BatchOutcome) -> Self {
        let mut output = Self::new();
        for report in &outcome.reports {
            output.add_report(report);
        }
        output.failures = outcome
            .failures
            .iter()
            .map(|f| JsonFailure {
                file: f.path.display().to_string(),
                error: f.error.clone(),
            })
            .collect();
        output
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FileFailure;
    use crate::segmentation::Segmentation;
    use std::path::PathBuf;

    fn report(path: &str) -> FileReport {
        FileReport {
            path: PathBuf::from(path),
            samples: 40,
            segmentation: Segmentation {
                breakpoints: Breakpoints::new(vec![0, 22, 40]).unwrap(),
                segments: Vec::new(),
                skipped: Vec::new(),
            },
            summary: Vec::new(),
        }
    }

    #[test]
    fn test_json_output_new() {
        let output = JsonOutput::new();
        assert_eq!(output.format, "motionseg-json-v1");
        assert!(output.files.is_empty());
    }

    #[test]
    fn test_json_breakpoints_are_plain_array() {
        let mut output = JsonOutput::new();
        output.add_report(&report("trial_01.csv"));
        let json = output.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files"][0]["breakpoints"], serde_json::json!([0, 22, 40]));
        assert_eq!(value["files"][0]["file"], "trial_01.csv");
        assert!(value["files"][0].get("skipped").is_none());
        assert!(value.get("failures").is_none());
    }

    #[test]
    fn test_json_from_outcome_lists_failures() {
        let outcome = BatchOutcome {
            reports: vec![report("a.csv")],
            failures: vec![FileFailure {
                path: PathBuf::from("b.csv"),
                error: "malformed input: time must be strictly increasing".to_string(),
            }],
        };
        let output = JsonOutput::from_outcome(&outcome);
        let json = output.to_json().unwrap();
        assert!(json.contains("\"failures\""));
        assert!(json.contains("b.csv"));

        let parsed: JsonOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.failures.len(), 1);
    }
}
