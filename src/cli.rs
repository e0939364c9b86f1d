//! CLI argument parsing for motionseg

use crate::batch::{HampelOptions, PipelineOptions};
use crate::error::{Result, SegmentError};
use crate::regression::TestMode;
use crate::segmentation::{FailurePolicy, IntersectionMode, SegmentationConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for segmentation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV summary table for spreadsheet analysis
    Csv,
}

/// Continuity constraints between adjacent fits
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntersectionArg {
    None,
    Left,
    LeftRight,
}

impl From<IntersectionArg> for IntersectionMode {
    fn from(arg: IntersectionArg) -> Self {
        match arg {
            IntersectionArg::None => IntersectionMode::None,
            IntersectionArg::Left => IntersectionMode::ForceLeft,
            IntersectionArg::LeftRight => IntersectionMode::ForceLeftAndRight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestModeArg {
    /// Compare slopes only
    Slope,
    /// Compare slope and intercept jointly
    Joint,
}

impl From<TestModeArg> for TestMode {
    fn from(arg: TestModeArg) -> Self {
        match arg {
            TestModeArg::Slope => TestMode::Slope,
            TestModeArg::Joint => TestMode::SlopeAndIntercept,
        }
    }
}

/// Parameter presets from the reaching protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Hand-held controller speed
    Controller,
    /// Head speed
    Head,
}

#[derive(Parser, Debug)]
#[command(name = "motionseg")]
#[command(version)]
#[command(about = "Piecewise-linear segmentation of motion-capture signals", long_about = None)]
pub struct Cli {
    /// Input files with two numeric columns: time,value
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Load segmentation parameters from a TOML file
    #[arg(long = "config", value_name = "TOML", conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Start from a parameter preset
    #[arg(long = "preset", value_enum)]
    pub preset: Option<Preset>,

    /// Width of the lookahead window
    #[arg(short = 'w', long = "window-size", value_name = "N")]
    pub window_size: Option<usize>,

    /// Width of the first left window of each segment (defaults to the window size)
    #[arg(long = "init-segment-size", value_name = "N")]
    pub init_segment_size: Option<usize>,

    /// Stride by which the left segment grows
    #[arg(long = "step", value_name = "N")]
    pub step: Option<usize>,

    /// Significance level below which a slope change is a break
    #[arg(short = 'a', long = "sig-level", value_name = "ALPHA")]
    pub sig_level: Option<f64>,

    /// Time delta treated as a capture pause
    #[arg(long = "gap-threshold", value_name = "SECONDS")]
    pub gap_threshold: Option<f64>,

    /// Force adjacent fits to join
    #[arg(long = "intersection", value_enum)]
    pub intersection: Option<IntersectionArg>,

    /// Coefficients compared by the divergence test
    #[arg(long = "test-mode", value_enum)]
    pub test_mode: Option<TestModeArg>,

    /// Remove outliers with a Hampel filter before segmenting
    #[arg(long = "clean")]
    pub clean: bool,

    /// Hampel neighbourhood half-width
    #[arg(long = "hampel-window", value_name = "N", default_value = "3")]
    pub hampel_window: usize,

    /// Hampel threshold in scaled MADs
    #[arg(long = "hampel-sigma", value_name = "SIGMA", default_value = "2.0")]
    pub hampel_sigma: f64,

    /// Fail a file when any super-segment fails instead of skipping it
    #[arg(long = "abort-on-failure")]
    pub abort_on_failure: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Also write <stem>_breakpoints.json and <stem>_summary.csv per file
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of worker threads (defaults to available parallelism)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Resolve the segmentation parameters: config file or preset, then flags
    pub fn segmentation_config(&self) -> Result<SegmentationConfig> {
        let mut config = match (&self.config, self.preset) {
            (Some(path), _) => SegmentationConfig::from_file(path)?,
            (None, Some(Preset::Controller)) => SegmentationConfig::controller(),
            (None, Some(Preset::Head)) => SegmentationConfig::head(),
            (None, None) => SegmentationConfig::default(),
        };

        if let Some(window_size) = self.window_size {
            config.window_size = window_size;
        }
        if let Some(init) = self.init_segment_size {
            config.init_segment_size = Some(init);
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(alpha) = self.sig_level {
            config.significance_level = alpha;
        }
        if let Some(gap) = self.gap_threshold {
            config.gap_threshold = gap;
        }
        if let Some(intersection) = self.intersection {
            config.intersection = intersection.into();
        }
        if let Some(mode) = self.test_mode {
            config.test_mode = mode.into();
        }
        if self.abort_on_failure {
            config.on_failure = FailurePolicy::Abort;
        }

        config.validate().map_err(SegmentError::InvalidConfig)?;
        Ok(config)
    }

    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        let hampel = self.clean.then_some(HampelOptions {
            window: self.hampel_window,
            n_sigma: self.hampel_sigma,
        });
        Ok(PipelineOptions {
            config: self.segmentation_config()?,
            hampel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parses_files() {
        let cli = Cli::parse_from(["motionseg", "a.csv", "b.csv"]);
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.clean);
    }

    #[test]
    fn test_cli_requires_files() {
        assert!(Cli::try_parse_from(["motionseg"]).is_err());
    }

    #[test]
    fn test_cli_defaults_to_default_config() {
        let cli = Cli::parse_from(["motionseg", "a.csv"]);
        assert_eq!(
            cli.segmentation_config().unwrap(),
            SegmentationConfig::default()
        );
    }

    #[test]
    fn test_cli_flags_override_preset() {
        let cli = Cli::parse_from([
            "motionseg",
            "--preset",
            "head",
            "--window-size",
            "15",
            "--intersection",
            "left-right",
            "--test-mode",
            "joint",
            "--abort-on-failure",
            "a.csv",
        ]);
        let config = cli.segmentation_config().unwrap();
        assert_eq!(config.window_size, 15);
        assert_eq!(config.initial_window(), 15);
        assert_eq!(config.significance_level, 1e-5);
        assert_eq!(config.intersection, IntersectionMode::ForceLeftAndRight);
        assert_eq!(config.test_mode, TestMode::SlopeAndIntercept);
        assert_eq!(config.on_failure, FailurePolicy::Abort);
    }

    #[test]
    fn test_cli_invalid_values_rejected() {
        let cli = Cli::parse_from(["motionseg", "--sig-level", "2.0", "a.csv"]);
        assert!(matches!(
            cli.segmentation_config(),
            Err(SegmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cli_config_conflicts_with_preset() {
        let result = Cli::try_parse_from([
            "motionseg",
            "--config",
            "seg.toml",
            "--preset",
            "controller",
            "a.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_config_file_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "window_size = 12\nsignificance_level = 0.001").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from(["motionseg", "--config", &path, "--step", "2", "a.csv"]);
        let config = cli.segmentation_config().unwrap();
        assert_eq!(config.window_size, 12);
        assert_eq!(config.significance_level, 0.001);
        assert_eq!(config.step, 2);
    }

    #[test]
    fn test_cli_clean_options() {
        let cli = Cli::parse_from(["motionseg", "a.csv"]);
        assert!(cli.pipeline_options().unwrap().hampel.is_none());

        let cli = Cli::parse_from(["motionseg", "--clean", "--hampel-sigma", "3", "a.csv"]);
        let hampel = cli.pipeline_options().unwrap().hampel.unwrap();
        assert_eq!(hampel.window, 3);
        assert_eq!(hampel.n_sigma, 3.0);
    }

    #[test]
    fn test_cli_format_and_jobs() {
        let cli = Cli::parse_from(["motionseg", "--format", "csv", "-j", "4", "a.csv"]);
        assert_eq!(cli.format, OutputFormat::Csv);
        assert_eq!(cli.jobs, Some(4));
    }
}
