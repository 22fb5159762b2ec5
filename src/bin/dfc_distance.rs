//! DFC Distance: Dissimilarity Matrices for a Range of Subjects
//!
//! Reads raw subject tensors `subject_{n}.json` (shape `(T, R, R)`) from an
//! input directory, builds each subject's T × T dissimilarity matrix and
//! writes it to `<output>/subject_{n}.json`.
//!
//! ## Protocol
//!
//! 1. Resolve the distance configuration (CLI flags or a JSON file)
//! 2. Load every subject in `--start..=--end`; unreadable files are skipped
//! 3. Compute matrices in parallel, one subject per task
//! 4. Write the matrices and print a per-subject summary

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

use dfc_topology::{
    io::{read_tensor_json, subject_file_name, write_matrix_json},
    run_batch,
    telemetry::init_tracing,
    BatchConfig,
    DistanceConfig,
    SubjectInput,
};

#[derive(Parser)]
#[command(name = "dfc_distance")]
#[command(about = "Persistent-homology dissimilarity matrices for dynamic functional connectivity")]
struct Args {
    /// Directory holding subject_{n}.json input tensors
    #[arg(short, long)]
    input: PathBuf,

    /// Directory receiving subject_{n}.json matrices
    /// (default: distance_matrices_<pipeline label>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// First subject number (1-based)
    #[arg(long, default_value = "1")]
    start: usize,

    /// Last subject number, inclusive
    #[arg(long)]
    end: usize,

    /// Pipeline: topological (tda) or traditional (non_tda)
    #[arg(short, long, default_value = "topological")]
    pipeline: String,

    /// Barcode metric: ws (optimal transport) or bn (bottleneck)
    #[arg(short, long)]
    metric: Option<String>,

    /// Decimal places kept in each entry
    #[arg(long)]
    precision: Option<u32>,

    /// Per-subject time limit in seconds
    #[arg(long)]
    deadline_secs: Option<f64>,

    /// JSON distance configuration; overrides --pipeline and --metric
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,
}

impl Args {
    fn distance_config(&self) -> Result<DistanceConfig> {
        let mut config = match &self.config {
            Some(path) => DistanceConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => DistanceConfig::from_options(&self.pipeline, self.metric.as_deref())?,
        };
        if let Some(precision) = self.precision {
            config = config.with_precision(precision);
        }
        if let Some(secs) = self.deadline_secs {
            let deadline = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid deadline {}", secs))?;
            config = config.with_deadline(deadline);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    if args.start == 0 || args.end < args.start {
        bail!("invalid subject range {}..={}", args.start, args.end);
    }

    let distance = args.distance_config()?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("distance_matrices_{}", distance.label())));
    let mut batch = BatchConfig::new(distance.clone());
    if let Some(threads) = args.threads {
        batch = batch.with_threads(threads);
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("  DFC Distance: {}", distance.label());
    println!("═══════════════════════════════════════════════════════════════\n");
    println!("Configuration:");
    println!("  Input     = {}", args.input.display());
    println!("  Output    = {}", output.display());
    println!("  Subjects  = {}..={}", args.start, args.end);
    println!("  Precision = {}", distance.precision);
    println!();

    let mut subjects = Vec::new();
    let mut unreadable = 0usize;
    for subject in args.start..=args.end {
        let path = args.input.join(subject_file_name(subject));
        match read_tensor_json(&path) {
            Ok(raw) => subjects.push(SubjectInput::new(subject, raw)),
            Err(err) => {
                error!(subject, path = %path.display(), error = %err, "cannot read subject");
                unreadable += 1;
            }
        }
    }
    info!(loaded = subjects.len(), unreadable, "subjects loaded");

    let report = run_batch(subjects, &batch)?;

    println!("Results:");
    println!("─────────────────────────────────────────────────────────────");
    for outcome in &report.outcomes {
        let path = write_matrix_json(&output, outcome.subject, &outcome.matrix)
            .with_context(|| format!("writing matrix for subject {}", outcome.subject))?;
        println!(
            "  Subject {:3}: T = {:4}, mean = {:.3}, {:.2}s → {}",
            outcome.subject,
            outcome.matrix.len(),
            outcome.matrix.mean_off_diagonal(),
            outcome.stats.elapsed.as_secs_f64(),
            path.display()
        );
    }
    for failure in &report.failures {
        println!("  Subject {:3}: FAILED ({})", failure.subject, failure.error);
    }

    println!("\n══════════════════════════════════════════════════════════════");
    println!("  Summary");
    println!("══════════════════════════════════════════════════════════════\n");
    println!("  Written      : {}", report.outcomes.len());
    println!("  Failed       : {}", report.failures.len() + unreadable);
    println!("    bad data   : {}", report.data_failures());
    println!("    unreadable : {}", unreadable);
    println!("  Wall time    : {:.2}s", report.wall_time.as_secs_f64());
    println!("  Compute time : {:.2}s", report.compute_time.as_secs_f64());

    Ok(())
}
