//! Batch Driver: Many Subjects, Isolated Failures
//!
//! Subjects are independent, so the batch fans out across a rayon pool
//! with one subject per task. Every task owns its normalized tensor,
//! signature cache and matrix; nothing is shared between tasks.
//!
//! A failing subject is logged with its id and reason and reported in
//! [`BatchReport::failures`]; the rest of the batch carries on. There are
//! no retries: every failure here is deterministic.

use std::time::{Duration, Instant};

use ndarray::ArrayD;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, info_span};

use crate::config::{BatchConfig, DistanceConfig};
use crate::engine::{compute_dissimilarity, DissimilarityMatrix, EngineStats};
use crate::error::{DfcError, Result};
use crate::normalize::{normalize_subject, NormalizationReport};

/// One subject's raw input
#[derive(Debug, Clone)]
pub struct SubjectInput {
    /// 1-based subject number, used in logs and output file names
    pub subject: usize,
    pub raw: ArrayD<f64>,
}

impl SubjectInput {
    pub fn new(subject: usize, raw: ArrayD<f64>) -> Self {
        Self { subject, raw }
    }
}

/// Successful result for one subject
#[derive(Debug, Clone, Serialize)]
pub struct SubjectOutcome {
    pub subject: usize,
    pub matrix: DissimilarityMatrix,
    pub stats: EngineStats,
    pub normalization: NormalizationReport,
}

/// A subject that could not be processed
#[derive(Debug)]
pub struct SubjectFailure {
    pub subject: usize,
    pub error: DfcError,
}

/// Everything a batch produced
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Sorted by subject number
    pub outcomes: Vec<SubjectOutcome>,
    /// Sorted by subject number
    pub failures: Vec<SubjectFailure>,
    /// Wall time of the whole batch
    pub wall_time: Duration,
    /// Sum of per-subject engine times
    pub compute_time: Duration,
}

impl BatchReport {
    pub fn n_subjects(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures caused by the subject's own data rather than the environment
    pub fn data_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.error.is_subject_local())
            .count()
    }
}

/// Normalize one subject and build its matrix
pub fn process_subject(
    subject: usize,
    raw: &ArrayD<f64>,
    config: &DistanceConfig,
) -> Result<SubjectOutcome> {
    let span = info_span!("subject", subject, pipeline = %config.label());
    let _guard = span.enter();

    let normalized = normalize_subject(raw)?;
    if !normalized.report.is_clean() {
        info!(
            nan_readings = normalized.report.nan_readings,
            nan_correlations = normalized.report.nan_correlations,
            clipped = normalized.report.clipped_values,
            "input repaired during normalization"
        );
    }

    let output = compute_dissimilarity(normalized.snapshots.view(), config)?;
    info!(
        timepoints = output.stats.timepoints,
        elapsed_ms = output.stats.elapsed.as_millis() as u64,
        "dissimilarity matrix ready"
    );

    Ok(SubjectOutcome {
        subject,
        matrix: output.matrix,
        stats: output.stats,
        normalization: normalized.report,
    })
}

/// Process every subject, in parallel, collecting successes and failures
pub fn run_batch(subjects: Vec<SubjectInput>, config: &BatchConfig) -> Result<BatchReport> {
    config.validate()?;
    let start = Instant::now();
    let distance = &config.distance;

    let work = || {
        subjects
            .into_par_iter()
            .map(|input| {
                let result = process_subject(input.subject, &input.raw, distance);
                (input.subject, result)
            })
            .collect::<Vec<_>>()
    };

    let results = match config.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| DfcError::InvalidConfig(format!("thread pool: {}", e)))?
            .install(work),
        None => work(),
    };

    let mut report = BatchReport::default();
    for (subject, result) in results {
        match result {
            Ok(outcome) => {
                report.compute_time += outcome.stats.elapsed;
                report.outcomes.push(outcome);
            }
            Err(err) => {
                error!(
                    subject,
                    data_error = err.is_subject_local(),
                    error = %err,
                    "subject skipped"
                );
                report.failures.push(SubjectFailure {
                    subject,
                    error: err,
                });
            }
        }
    }
    report.outcomes.sort_by_key(|o| o.subject);
    report.failures.sort_by_key(|f| f.subject);
    report.wall_time = start.elapsed();

    info!(
        succeeded = report.outcomes.len(),
        failed = report.failures.len(),
        wall_ms = report.wall_time.as_millis() as u64,
        "batch complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Metric;
    use crate::synthetic::SyntheticSubject;
    use ndarray::IxDyn;

    fn synthetic_input(subject: usize, seed: u64) -> SubjectInput {
        let raw = SyntheticSubject::new(6, 7, 2).with_seed(seed).generate();
        SubjectInput::new(subject, raw.into_dyn())
    }

    #[test]
    fn test_failures_are_isolated() {
        let subjects = vec![
            synthetic_input(3, 30),
            SubjectInput::new(2, ArrayD::zeros(IxDyn(&[4, 3]))),
            synthetic_input(1, 10),
            SubjectInput::new(4, ArrayD::zeros(IxDyn(&[2, 3, 5]))),
        ];
        let config = BatchConfig::new(DistanceConfig::topological(Metric::OptimalTransport))
            .with_threads(2);
        let report = run_batch(subjects, &config).unwrap();

        assert_eq!(report.n_subjects(), 4);
        assert!(!report.all_succeeded());
        let ok: Vec<usize> = report.outcomes.iter().map(|o| o.subject).collect();
        let failed: Vec<usize> = report.failures.iter().map(|f| f.subject).collect();
        assert_eq!(ok, vec![1, 3]);
        assert_eq!(failed, vec![2, 4]);
        assert_eq!(report.data_failures(), 2);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.error, DfcError::InputShape { .. })));
        for outcome in &report.outcomes {
            assert_eq!(outcome.matrix.len(), 6);
            assert_eq!(outcome.stats.extractions, 6);
            assert!(outcome.matrix.is_symmetric());
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = DistanceConfig::topological(Metric::Bottleneck);
        let inputs: Vec<SubjectInput> = (1..=4).map(|s| synthetic_input(s, s as u64)).collect();
        let sequential: Vec<DissimilarityMatrix> = inputs
            .iter()
            .map(|i| process_subject(i.subject, &i.raw, &config).unwrap().matrix)
            .collect();

        let report = run_batch(inputs, &BatchConfig::new(config)).unwrap();
        let parallel: Vec<DissimilarityMatrix> =
            report.outcomes.into_iter().map(|o| o.matrix).collect();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_invalid_config_aborts_batch() {
        let config = BatchConfig::default().with_threads(0);
        assert!(matches!(
            run_batch(vec![synthetic_input(1, 1)], &config),
            Err(DfcError::InvalidConfig(_))
        ));
    }
}
