//! Multi-file driver
//!
//! Runs the full pipeline (ingest, optional Hampel cleaning, segmentation,
//! summary) once per input file. Files are independent, so they are spread
//! over a small pool of scoped worker threads pulling from a lock-free
//! queue. Reports come back in input order regardless of which worker
//! finished first.
//!
//! A file that fails is reported by path and does not stop the batch.

use crate::noise_filter;
use crate::segmentation::{segment_series, Segmentation, SegmentationConfig};
use crate::series::Series;
use crate::summary::{summarize, SegmentSummary};
use anyhow::{anyhow, Context, Result};
use crossbeam::queue::ArrayQueue;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Hampel cleaning parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HampelOptions {
    /// Half-width of the neighbourhood
    pub window: usize,
    pub n_sigma: f64,
}

impl Default for HampelOptions {
    fn default() -> Self {
        Self {
            window: 3,
            n_sigma: 2.0,
        }
    }
}

/// Everything the pipeline needs besides the input
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub config: SegmentationConfig,
    pub hampel: Option<HampelOptions>,
}

/// Pipeline output for one file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub samples: usize,
    pub segmentation: Segmentation,
    pub summary: Vec<SegmentSummary>,
}

/// A file the pipeline could not process
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Reports and failures, both in input order
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    /// True when at least one file was given and none succeeded
    pub fn all_failed(&self) -> bool {
        self.reports.is_empty() && !self.failures.is_empty()
    }
}

/// Clean (optionally), segment and summarize an in-memory series
pub fn process_series(
    series: &Series,
    options: &PipelineOptions,
) -> crate::error::Result<(Segmentation, Vec<SegmentSummary>)> {
    let cleaned;
    let series = match options.hampel {
        Some(hampel) => {
            cleaned = noise_filter::clean(
                series,
                hampel.window,
                hampel.n_sigma,
                options.config.gap_threshold,
            )?;
            &cleaned
        }
        None => series,
    };

    let segmentation = segment_series(series, &options.config)?;
    let summary = summarize(series, &segmentation.segments, &options.config)?;
    Ok((segmentation, summary))
}

/// Run the pipeline on one `time,value` file
pub fn process_file(path: &Path, options: &PipelineOptions) -> Result<FileReport> {
    let start = Instant::now();

    let series = Series::from_file(path)
        .with_context(|| format!("Failed to read series from {}", path.display()))?;
    let (segmentation, summary) = process_series(&series, options)
        .with_context(|| format!("Failed to segment {}", path.display()))?;

    info!(
        file = %path.display(),
        samples = series.len(),
        segments = segmentation.segments.len(),
        skipped = segmentation.skipped.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "processed file"
    );

    Ok(FileReport {
        path: path.to_path_buf(),
        samples: series.len(),
        segmentation,
        summary,
    })
}

/// Process `paths` on up to `jobs` worker threads
pub fn run_batch(paths: &[PathBuf], options: &PipelineOptions, jobs: usize) -> BatchOutcome {
    let results = run_jobs(paths, jobs, |path| process_file(path, options));

    let mut outcome = BatchOutcome::default();
    for (path, result) in paths.iter().zip(results) {
        let error = match result {
            Some(Ok(report)) => {
                outcome.reports.push(report);
                continue;
            }
            Some(Err(e)) => format!("{:#}", e),
            None => "worker stopped before finishing".to_string(),
        };
        warn!(file = %path.display(), "failed: {}", error);
        outcome.failures.push(FileFailure {
            path: path.clone(),
            error,
        });
    }
    outcome
}

/// Run `job` once per path on scoped workers, results indexed like `paths`
///
/// A panicking job becomes an error for its own path only. `None` marks a
/// path no worker got to.
fn run_jobs<T, F>(paths: &[PathBuf], jobs: usize, job: F) -> Vec<Option<Result<T>>>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync,
{
    let mut slots: Vec<Option<Result<T>>> = paths.iter().map(|_| None).collect();
    if paths.is_empty() {
        return slots;
    }

    let workers = jobs.clamp(1, paths.len());
    let queue = ArrayQueue::new(paths.len());
    for item in paths.iter().enumerate() {
        // Capacity equals the number of jobs
        let _ = queue.push(item);
    }

    let queue = &queue;
    let job = &job;
    let scoped = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move |_| {
                    let mut done = Vec::new();
                    while let Some((index, path)) = queue.pop() {
                        let result = panic::catch_unwind(AssertUnwindSafe(|| job(path)))
                            .unwrap_or_else(|_| {
                                Err(anyhow!("panicked while processing {}", path.display()))
                            });
                        done.push((index, result));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .flatten()
            .collect::<Vec<_>>()
    });

    match scoped {
        Ok(done) => {
            for (index, result) in done {
                slots[index] = Some(result);
            }
        }
        Err(_) => warn!("a batch worker panicked"),
    }
    slots
}

/// File stems for per-file artifacts, suffixed `_2`, `_3`, ... where inputs
/// from different directories share a stem
pub fn artifact_stems(reports: &[FileReport]) -> Vec<String> {
    let mut taken = HashSet::new();
    reports
        .iter()
        .map(|report| {
            let stem = report
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "series".to_string());
            let mut candidate = stem.clone();
            let mut k = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{}_{}", stem, k);
                k += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_ramp(dir: &Path, name: &str, n: usize) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "time,value").unwrap();
        for i in 0..n {
            let t = i as f64 * 0.01;
            let wiggle = if i % 2 == 0 { 0.002 } else { -0.002 };
            writeln!(file, "{},{}", t, 0.5 * t + wiggle).unwrap();
        }
        path
    }

    #[test]
    fn test_process_series_without_cleaning() {
        let time: Vec<f64> = (0..15).map(|i| i as f64 * 0.01).collect();
        let value: Vec<f64> = time.iter().map(|t| 2.0 * t).collect();
        let series = Series::new(time, value).unwrap();

        let (segmentation, summary) =
            process_series(&series, &PipelineOptions::default()).unwrap();
        assert_eq!(segmentation.breakpoints.as_slice(), &[0, 15]);
        assert_eq!(summary.len(), 1);
    }

    #[test]
    fn test_process_series_with_cleaning_removes_spike() {
        let time: Vec<f64> = (0..15).map(|i| i as f64 * 0.01).collect();
        let mut value: Vec<f64> = time.iter().map(|t| 2.0 * t).collect();
        value[7] = 50.0;
        let series = Series::new(time, value).unwrap();

        let options = PipelineOptions {
            hampel: Some(HampelOptions::default()),
            ..PipelineOptions::default()
        };
        let (_, summary) = process_series(&series, &options).unwrap();
        assert!(summary[0].max < 1.0, "spike survived: {}", summary[0].max);
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..6)
            .map(|k| write_ramp(dir.path(), &format!("trial_{}.csv", k), 20 + k))
            .collect();

        let outcome = run_batch(&paths, &PipelineOptions::default(), 3);
        assert!(outcome.failures.is_empty());
        let samples: Vec<usize> = outcome.reports.iter().map(|r| r.samples).collect();
        assert_eq!(samples, vec![20, 21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_batch_reports_failures_by_path() {
        let dir = TempDir::new().unwrap();
        let good = write_ramp(dir.path(), "good.csv", 25);
        let missing = dir.path().join("missing.csv");
        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "time,value\n0.0,1.0\n0.0,2.0\n").unwrap();

        let outcome = run_batch(
            &[missing.clone(), good, bad.clone()],
            &PipelineOptions::default(),
            2,
        );
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].path, missing);
        assert_eq!(outcome.failures[1].path, bad);
        assert!(!outcome.all_failed());
    }

    #[test]
    fn test_panicking_job_only_fails_its_own_path() {
        let paths: Vec<PathBuf> = ["a.csv", "b.csv", "c.csv", "d.csv"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let results = run_jobs(&paths, 1, |path| {
            if path == Path::new("b.csv") {
                panic!("corrupt capture");
            }
            Ok(path.display().to_string())
        });

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().as_ref().unwrap(), "a.csv");
        let err = results[1].as_ref().unwrap().as_ref().unwrap_err();
        assert!(err.to_string().contains("panicked"));
        assert_eq!(results[2].as_ref().unwrap().as_ref().unwrap(), "c.csv");
        assert_eq!(results[3].as_ref().unwrap().as_ref().unwrap(), "d.csv");
    }

    #[test]
    fn test_run_jobs_empty() {
        let results = run_jobs(&[], 4, |_| Ok(()));
        assert!(results.is_empty());
    }

    #[test]
    fn test_artifact_stems_disambiguate_shared_names() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("left")).unwrap();
        std::fs::create_dir(dir.path().join("right")).unwrap();
        let paths = vec![
            write_ramp(&dir.path().join("left"), "trial.csv", 20),
            write_ramp(&dir.path().join("right"), "trial.csv", 20),
            write_ramp(dir.path(), "other.csv", 20),
            write_ramp(dir.path(), "trial.txt", 20),
        ];

        let outcome = run_batch(&paths, &PipelineOptions::default(), 2);
        assert_eq!(
            artifact_stems(&outcome.reports),
            vec!["trial", "trial_2", "other", "trial_3"]
        );
    }

    #[test]
    fn test_all_failed() {
        let dir = TempDir::new().unwrap();
        let outcome = run_batch(
            &[dir.path().join("nope.csv")],
            &PipelineOptions::default(),
            1,
        );
        assert!(outcome.all_failed());
        assert!(!BatchOutcome::default().all_failed());
    }
}
