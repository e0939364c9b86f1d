use anyhow::{Context, Result};
use clap::Parser;
use motionseg::batch::{artifact_stems, run_batch, BatchOutcome, FileReport};
use motionseg::cli::{Cli, OutputFormat};
use motionseg::csv_output::CsvOutput;
use motionseg::json_output::JsonOutput;
use std::fmt::Write as _;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces TRACE, otherwise RUST_LOG governs
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Human-readable report of one file
fn render_text(report: &FileReport) -> String {
    let mut out = String::new();
    let segmentation = &report.segmentation;

    let _ = writeln!(
        out,
        "{}: {} samples, {} segments",
        report.path.display(),
        report.samples,
        segmentation.segments.len()
    );
    let _ = writeln!(out, "  breakpoints: {}", segmentation.breakpoints);
    for skipped in &segmentation.skipped {
        let _ = writeln!(
            out,
            "  skipped super-segment {} ({}..{}): {}",
            skipped.index, skipped.start, skipped.end, skipped.reason
        );
    }

    if report.summary.is_empty() {
        return out;
    }

    let _ = writeln!(
        out,
        "  {:>5} {:>7} {:>7} {:>5} {:>10} {:>10} {:>10} {:>12}",
        "index", "start", "end", "n", "duration", "mean", "slope", "onset_p"
    );
    for row in &report.summary {
        let _ = writeln!(
            out,
            "  {:>5} {:>7} {:>7} {:>5} {:>10.4} {:>10.4} {:>10} {:>12}",
            row.index,
            row.start,
            row.end,
            row.n,
            row.duration,
            row.mean,
            format_optional(row.slope, 4),
            row.onset_pvalue
                .map(|p| format!("{:.3e}", p))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    out
}

/// Write `<stem>_breakpoints.json` and `<stem>_summary.csv` for one file
fn write_artifacts(dir: &Path, stem: &str, report: &FileReport) -> Result<()> {
    let breakpoints_path = dir.join(format!("{}_breakpoints.json", stem));
    let json = report.segmentation.breakpoints.to_json()?;
    std::fs::write(&breakpoints_path, json)
        .with_context(|| format!("Failed to write {}", breakpoints_path.display()))?;

    let mut csv = CsvOutput::new(false);
    csv.add_rows(&report.path.display().to_string(), &report.summary);
    let summary_path = dir.join(format!("{}_summary.csv", stem));
    std::fs::write(&summary_path, csv.to_csv())
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    Ok(())
}

fn print_outcome(outcome: &BatchOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for report in &outcome.reports {
                print!("{}", render_text(report));
            }
        }
        OutputFormat::Json => {
            println!("{}", JsonOutput::from_outcome(outcome).to_json()?);
        }
        OutputFormat::Csv => {
            let mut csv = CsvOutput::new(true);
            for report in &outcome.reports {
                csv.add_rows(&report.path.display().to_string(), &report.summary);
            }
            print!("{}", csv.to_csv());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing (warn by default, TRACE with --debug)
    init_tracing(args.debug);

    let options = args
        .pipeline_options()
        .context("Invalid segmentation parameters")?;
    let jobs = args.jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    let outcome = run_batch(&args.files, &options, jobs);
    print_outcome(&outcome, args.format)?;

    let mut artifact_errors = 0usize;
    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let stems = artifact_stems(&outcome.reports);
        for (report, stem) in outcome.reports.iter().zip(&stems) {
            if let Err(e) = write_artifacts(dir, stem, report) {
                eprintln!("error: {}: {:#}", report.path.display(), e);
                artifact_errors += 1;
            }
        }
    }

    for failure in &outcome.failures {
        eprintln!("error: {}: {}", failure.path.display(), failure.error);
    }

    if outcome.all_failed() {
        anyhow::bail!("All {} input files failed", outcome.failures.len());
    }
    if artifact_errors > 0 {
        anyhow::bail!("Failed to write artifacts for {} files", artifact_errors);
    }

    Ok(())
}
