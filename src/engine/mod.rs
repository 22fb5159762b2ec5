//! Pairwise Dissimilarity Engine
//!
//! Turns one subject's normalized snapshots `(T, R, R)` into a symmetric
//! T × T dissimilarity matrix.
//!
//! ## Algorithm
//!
//! ```text
//! for i in 0..T:
//!     ensure signature(i)               ─┐ at most T extractions,
//!     for j in 0..i:                     │ each cached in an arena
//!         ensure signature(j)           ─┘
//!         m[i][j] = m[j][i] = round(dist(sig(i), sig(j)), 3)
//! ```
//!
//! What a "signature" is depends on the [`SnapshotMeasure`]:
//!
//! - [`TopologicalMeasure`]: the degree-0 barcode of the snapshot,
//!   compared by Wasserstein or bottleneck distance.
//! - [`TraditionalMeasure`]: the snapshot itself, compared by Frobenius
//!   norm. Caching is trivial here but keeps both pipelines on one loop.
//!
//! A failed extraction voids the whole subject; no partial matrix escapes.

mod cache;
mod matrix;

pub use cache::SignatureCache;
pub use matrix::{round_to, DissimilarityMatrix};

use std::time::{Duration, Instant};

use ndarray::{Array2, ArrayView2, ArrayView3, Axis};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{DistanceConfig, Metric, Pipeline, DEFAULT_PRECISION};
use crate::distance::{barcode_distance, frobenius_distance};
use crate::error::{DfcError, Result};
use crate::topology::{degree0_barcode, Barcode};

/// How timepoints are summarized and compared
pub trait SnapshotMeasure {
    /// Cached per-timepoint representation
    type Signature;

    /// Derive the signature of one normalized snapshot
    fn extract(&self, snapshot: ArrayView2<f64>) -> Result<Self::Signature>;

    /// Distance between two signatures (unrounded)
    fn compare(&self, a: &Self::Signature, b: &Self::Signature) -> f64;

    /// Identifier used in logs
    fn label(&self) -> String;
}

/// Barcodes compared by a barcode metric
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologicalMeasure {
    pub metric: Metric,
}

impl TopologicalMeasure {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl SnapshotMeasure for TopologicalMeasure {
    type Signature = Barcode;

    fn extract(&self, snapshot: ArrayView2<f64>) -> Result<Barcode> {
        degree0_barcode(snapshot)
    }

    fn compare(&self, a: &Barcode, b: &Barcode) -> f64 {
        barcode_distance(a, b, self.metric)
    }

    fn label(&self) -> String {
        format!("topological/{}", self.metric)
    }
}

/// Raw snapshots compared by Frobenius norm
#[derive(Debug, Clone, Copy, Default)]
pub struct TraditionalMeasure;

impl SnapshotMeasure for TraditionalMeasure {
    type Signature = Array2<f64>;

    fn extract(&self, snapshot: ArrayView2<f64>) -> Result<Array2<f64>> {
        if let Some(bad) = snapshot.iter().find(|v| !v.is_finite()) {
            return Err(DfcError::MalformedDistanceMatrix(format!(
                "non-finite entry {}",
                bad
            )));
        }
        Ok(snapshot.to_owned())
    }

    fn compare(&self, a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        frobenius_distance(a.view(), b.view())
    }

    fn label(&self) -> String {
        "traditional/frobenius".to_string()
    }
}

/// Work counters for one subject
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStats {
    pub timepoints: usize,
    pub extractions: usize,
    pub distance_evaluations: usize,
    pub elapsed: Duration,
}

/// Matrix plus counters
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub matrix: DissimilarityMatrix,
    pub stats: EngineStats,
}

/// Single-subject, single-threaded matrix builder
#[derive(Debug, Clone)]
pub struct DissimilarityEngine<M> {
    measure: M,
    precision: u32,
    deadline: Option<Duration>,
}

impl<M: SnapshotMeasure> DissimilarityEngine<M> {
    pub fn new(measure: M) -> Self {
        Self {
            measure,
            precision: DEFAULT_PRECISION,
            deadline: None,
        }
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Abort with `DeadlineExceeded` once this much wall time has passed
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn measure(&self) -> &M {
        &self.measure
    }

    /// Build the T × T matrix for snapshots shaped `(T, R, R)`
    pub fn compute(&self, snapshots: ArrayView3<f64>) -> Result<EngineOutput> {
        let start = Instant::now();
        let n = snapshots.len_of(Axis(0));
        let mut cache = SignatureCache::new(n);
        let mut matrix = DissimilarityMatrix::zeros(n);
        let mut evaluations = 0usize;

        for i in 0..n {
            if let Some(deadline) = self.deadline {
                if start.elapsed() > deadline {
                    return Err(DfcError::DeadlineExceeded {
                        completed_rows: i,
                        total_rows: n,
                    });
                }
            }

            self.ensure_signature(&mut cache, snapshots, i)?;
            for j in 0..i {
                self.ensure_signature(&mut cache, snapshots, j)?;
                let (a, b) = match (cache.get(i), cache.get(j)) {
                    (Some(a), Some(b)) => (a, b),
                    _ => {
                        return Err(DfcError::Extraction {
                            timepoint: i,
                            reason: "signature missing from cache".into(),
                        })
                    }
                };
                let distance = round_to(self.measure.compare(a, b), self.precision);
                matrix.set_pair(i, j, distance);
                evaluations += 1;
            }
            trace!(row = i, "row complete");
        }

        let stats = EngineStats {
            timepoints: n,
            extractions: cache.filled(),
            distance_evaluations: evaluations,
            elapsed: start.elapsed(),
        };
        debug!(
            measure = %self.measure.label(),
            timepoints = n,
            extractions = stats.extractions,
            evaluations = stats.distance_evaluations,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "dissimilarity matrix computed"
        );

        Ok(EngineOutput { matrix, stats })
    }

    fn ensure_signature(
        &self,
        cache: &mut SignatureCache<M::Signature>,
        snapshots: ArrayView3<f64>,
        timepoint: usize,
    ) -> Result<()> {
        cache
            .ensure(timepoint, || {
                self.measure
                    .extract(snapshots.index_axis(Axis(0), timepoint))
            })
            .map(|_| ())
            .map_err(|e| match e {
                DfcError::Extraction { .. } => e,
                other => DfcError::Extraction {
                    timepoint,
                    reason: other.to_string(),
                },
            })
    }
}

/// Build one subject's matrix with the configured pipeline
pub fn compute_dissimilarity(
    snapshots: ArrayView3<f64>,
    config: &DistanceConfig,
) -> Result<EngineOutput> {
    config.validate()?;
    match config.pipeline {
        Pipeline::Topological => DissimilarityEngine::new(TopologicalMeasure::new(config.metric))
            .with_precision(config.precision)
            .with_deadline(config.deadline)
            .compute(snapshots),
        Pipeline::Traditional => DissimilarityEngine::new(TraditionalMeasure)
            .with_precision(config.precision)
            .with_deadline(config.deadline)
            .compute(snapshots),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::diagonal_mass;
    use crate::normalize::normalize_tensor;
    use crate::synthetic::SyntheticSubject;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};
    use std::cell::Cell;

    /// Wraps a measure and counts calls
    struct Counting<M> {
        inner: M,
        extractions: Cell<usize>,
        comparisons: Cell<usize>,
    }

    impl<M> Counting<M> {
        fn new(inner: M) -> Self {
            Self {
                inner,
                extractions: Cell::new(0),
                comparisons: Cell::new(0),
            }
        }
    }

    impl<M: SnapshotMeasure> SnapshotMeasure for Counting<M> {
        type Signature = M::Signature;

        fn extract(&self, snapshot: ArrayView2<f64>) -> Result<Self::Signature> {
            self.extractions.set(self.extractions.get() + 1);
            self.inner.extract(snapshot)
        }

        fn compare(&self, a: &Self::Signature, b: &Self::Signature) -> f64 {
            self.comparisons.set(self.comparisons.get() + 1);
            self.inner.compare(a, b)
        }

        fn label(&self) -> String {
            self.inner.label()
        }
    }

    fn stack(snapshots: &[Array2<f64>]) -> Array3<f64> {
        let r = snapshots[0].nrows();
        let mut out = Array3::zeros((snapshots.len(), r, r));
        for (t, s) in snapshots.iter().enumerate() {
            out.index_axis_mut(Axis(0), t).assign(s);
        }
        out
    }

    fn synthetic_snapshots(timepoints: usize, seed: u64) -> Array3<f64> {
        let raw = SyntheticSubject::new(timepoints, 8, 3).with_seed(seed).generate();
        normalize_tensor(raw.view()).unwrap().snapshots
    }

    fn assert_invariants(m: &DissimilarityMatrix) {
        for i in 0..m.len() {
            assert_eq!(m.get(i, i), 0.0);
            for j in 0..m.len() {
                assert_eq!(m.get(i, j), m.get(j, i));
                assert!(m.get(i, j) >= 0.0);
            }
        }
    }

    #[test]
    fn test_memoization_counts() {
        let snapshots = synthetic_snapshots(5, 11);
        let engine = DissimilarityEngine::new(Counting::new(TopologicalMeasure::default()));
        let out = engine.compute(snapshots.view()).unwrap();

        assert_eq!(engine.measure().extractions.get(), 5);
        assert_eq!(engine.measure().comparisons.get(), 10);
        assert_eq!(out.stats.extractions, 5);
        assert_eq!(out.stats.distance_evaluations, 10);
    }

    #[test]
    fn test_invariants_all_configurations() {
        let snapshots = synthetic_snapshots(12, 3);
        for config in [
            DistanceConfig::topological(Metric::OptimalTransport),
            DistanceConfig::topological(Metric::Bottleneck),
            DistanceConfig::traditional(),
        ] {
            let out = compute_dissimilarity(snapshots.view(), &config).unwrap();
            assert_eq!(out.matrix.len(), 12);
            assert!(out.matrix.is_symmetric());
            assert_invariants(&out.matrix);
        }
    }

    #[test]
    fn test_deterministic() {
        let snapshots = synthetic_snapshots(9, 5);
        let config = DistanceConfig::topological(Metric::OptimalTransport);
        let a = compute_dissimilarity(snapshots.view(), &config).unwrap();
        let b = compute_dissimilarity(snapshots.view(), &config).unwrap();
        assert_eq!(a.matrix, b.matrix);
        assert_eq!(
            serde_json::to_string(&a.matrix).unwrap(),
            serde_json::to_string(&b.matrix).unwrap()
        );
    }

    #[test]
    fn test_repeated_snapshot_scenario() {
        let s1 = array![
            [0.0, 0.2, 0.9],
            [0.2, 0.0, 0.6],
            [0.9, 0.6, 0.0]
        ];
        let s3 = array![
            [0.0, 0.7, 0.3],
            [0.7, 0.0, 0.95],
            [0.3, 0.95, 0.0]
        ];
        let snapshots = stack(&[s1.clone(), s1, s3]);

        for config in [
            DistanceConfig::topological(Metric::OptimalTransport),
            DistanceConfig::topological(Metric::Bottleneck),
            DistanceConfig::traditional(),
        ] {
            let m = compute_dissimilarity(snapshots.view(), &config).unwrap().matrix;
            assert_eq!(m.get(0, 1), 0.0, "{:?}", config.pipeline);
            assert_eq!(m.get(0, 2), m.get(1, 2));
            assert!(m.get(0, 2) > 0.0);
        }
    }

    #[test]
    fn test_coincident_snapshot_sends_mass_to_diagonal() {
        let coincident = Array2::<f64>::zeros((4, 4));
        let varied = array![
            [0.0, 0.2, 0.9, 0.4],
            [0.2, 0.0, 0.6, 0.8],
            [0.9, 0.6, 0.0, 0.3],
            [0.4, 0.8, 0.3, 0.0]
        ];
        let measure = TopologicalMeasure::new(Metric::OptimalTransport);
        let empty = measure.extract(coincident.view()).unwrap();
        let barcode = measure.extract(varied.view()).unwrap();
        assert!(empty.is_empty());

        let expected: f64 = barcode.iter().map(|p| p.persistence() / 2.0).sum();
        assert_abs_diff_eq!(measure.compare(&empty, &barcode), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(diagonal_mass(&barcode), expected, epsilon = 1e-12);

        let m = compute_dissimilarity(
            stack(&[coincident, varied]).view(),
            &DistanceConfig::topological(Metric::OptimalTransport),
        )
        .unwrap()
        .matrix;
        assert_eq!(m.get(1, 0), round_to(expected, 3));
    }

    #[test]
    fn test_traditional_reports_rounded_frobenius() {
        let a = array![[0.0, 0.3], [0.3, 0.0]];
        let b = array![[0.0, 0.8], [0.8, 0.0]];
        // sqrt(2 * 0.25) = 0.70710678...
        let m = compute_dissimilarity(stack(&[a, b]).view(), &DistanceConfig::traditional())
            .unwrap()
            .matrix;
        assert_eq!(m.get(0, 1), 0.707);
        assert_eq!(m.get(1, 0), 0.707);
    }

    #[test]
    fn test_precision_is_configurable() {
        let a = array![[0.0, 0.3], [0.3, 0.0]];
        let b = array![[0.0, 0.8], [0.8, 0.0]];
        let config = DistanceConfig::traditional().with_precision(5);
        let m = compute_dissimilarity(stack(&[a, b]).view(), &config).unwrap().matrix;
        assert_eq!(m.get(0, 1), 0.70711);
    }

    #[test]
    fn test_extraction_failure_voids_subject() {
        let good = array![[0.0, 0.5], [0.5, 0.0]];
        let bad = array![[0.0, f64::NAN], [f64::NAN, 0.0]];
        let snapshots = stack(&[good.clone(), good, bad]);
        let engine = DissimilarityEngine::new(TopologicalMeasure::default());
        match engine.compute(snapshots.view()) {
            Err(DfcError::Extraction { timepoint, .. }) => assert_eq!(timepoint, 2),
            other => panic!("expected extraction failure, got {:?}", other.map(|o| o.stats)),
        }

        let err = DissimilarityEngine::new(TraditionalMeasure).compute(snapshots.view());
        assert!(matches!(err, Err(DfcError::Extraction { timepoint: 2, .. })));
    }

    #[test]
    fn test_trivial_sizes() {
        let empty = Array3::<f64>::zeros((0, 3, 3));
        let out = compute_dissimilarity(empty.view(), &DistanceConfig::default()).unwrap();
        assert!(out.matrix.is_empty());
        assert_eq!(out.stats.extractions, 0);

        let single = Array3::<f64>::zeros((1, 3, 3));
        let out = compute_dissimilarity(single.view(), &DistanceConfig::default()).unwrap();
        assert_eq!(out.matrix.len(), 1);
        assert_eq!(out.stats.extractions, 1);
        assert_eq!(out.stats.distance_evaluations, 0);
    }

    /// Sleeps on every extraction so a tiny deadline always trips
    struct Slow;

    impl SnapshotMeasure for Slow {
        type Signature = ();

        fn extract(&self, _snapshot: ArrayView2<f64>) -> Result<()> {
            std::thread::sleep(Duration::from_millis(2));
            Ok(())
        }

        fn compare(&self, _a: &(), _b: &()) -> f64 {
            0.0
        }

        fn label(&self) -> String {
            "slow".into()
        }
    }

    #[test]
    fn test_deadline_exceeded() {
        let snapshots = Array3::<f64>::zeros((6, 2, 2));
        let engine = DissimilarityEngine::new(Slow).with_deadline(Some(Duration::from_millis(1)));
        match engine.compute(snapshots.view()) {
            Err(DfcError::DeadlineExceeded {
                completed_rows,
                total_rows,
            }) => {
                assert_eq!(total_rows, 6);
                assert!(completed_rows >= 1 && completed_rows < 6);
            }
            other => panic!("expected deadline error, got {:?}", other.map(|o| o.stats)),
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let snapshots = synthetic_snapshots(3, 2);
        let config = DistanceConfig::default().with_precision(99);
        assert!(matches!(
            compute_dissimilarity(snapshots.view(), &config),
            Err(DfcError::InvalidConfig(_))
        ));
    }
}
