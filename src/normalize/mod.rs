//! Snapshot Normalizer: Raw Windows → Bounded Dissimilarities
//!
//! Each timepoint of a subject tensor `(T, R, R)` is a window of ROI
//! readings (rows = observations, columns = regions). The normalizer turns
//! every window into an `R × R` dissimilarity matrix:
//!
//!   d(a, b) = sqrt(max(1 - c(a, b)², 0))
//!
//! where c is the Pearson correlation between regions a and b. Perfect
//! correlation or anti-correlation maps to 0, no correlation maps to 1.
//!
//! ## Degenerate Input
//!
//! - NaN readings are zeroed before the correlation is taken.
//! - Undefined correlations (constant regions) are zeroed and reported.
//! - Correlations drifting outside [-1, 1] are clipped and reported.
//!
//! Correction always proceeds; only a malformed tensor shape is fatal.

mod correlation;

pub use correlation::pearson_columns;

use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayView3, Axis, Ix3};
use serde::Serialize;
use tracing::warn;

use crate::error::{DfcError, Result};

/// Counts of numeric repairs applied while normalizing one subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub timepoints: usize,
    /// Non-finite raw readings replaced by zero
    pub nan_readings: usize,
    /// Undefined correlations replaced by zero
    pub nan_correlations: usize,
    /// Correlations clipped into [-1, 1]
    pub clipped_values: usize,
    /// Timepoints that needed any correlation repair
    pub flagged_timepoints: Vec<usize>,
}

impl NormalizationReport {
    pub fn is_clean(&self) -> bool {
        self.nan_readings == 0 && self.nan_correlations == 0 && self.clipped_values == 0
    }

    /// Fold one window's repairs into the subject totals
    pub fn record(&mut self, timepoint: usize, diag: SnapshotDiagnostics) {
        self.nan_readings += diag.nan_readings;
        self.nan_correlations += diag.nan_correlations;
        self.clipped_values += diag.clipped_values;
        if diag.nan_correlations > 0 || diag.clipped_values > 0 {
            self.flagged_timepoints.push(timepoint);
        }
    }
}

/// Repairs applied to a single window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotDiagnostics {
    pub nan_readings: usize,
    pub nan_correlations: usize,
    pub clipped_values: usize,
}

/// Normalized snapshots for one subject, plus what had to be repaired
#[derive(Debug, Clone)]
pub struct NormalizedSubject {
    pub snapshots: Array3<f64>,
    pub report: NormalizationReport,
}

impl NormalizedSubject {
    pub fn n_timepoints(&self) -> usize {
        self.snapshots.len_of(Axis(0))
    }

    pub fn n_regions(&self) -> usize {
        self.snapshots.len_of(Axis(1))
    }
}

/// Map a correlation coefficient to a dissimilarity in [0, 1]
#[inline]
pub fn correlation_to_distance(c: f64) -> f64 {
    (1.0 - c * c).max(0.0).sqrt()
}

/// Normalize a tensor of arbitrary rank, rejecting anything but `(T, R, R)`
pub fn normalize_subject(raw: &ArrayD<f64>) -> Result<NormalizedSubject> {
    let shape = raw.shape().to_vec();
    let tensor = raw
        .view()
        .into_dimensionality::<Ix3>()
        .map_err(|_| DfcError::shape("rank-3 tensor (T, R, R)", &shape))?;
    normalize_tensor(tensor)
}

/// Normalize a rank-3 tensor `(T, R, R)`
pub fn normalize_tensor(raw: ArrayView3<f64>) -> Result<NormalizedSubject> {
    let (n_time, r1, r2) = raw.dim();
    if r1 != r2 {
        return Err(DfcError::shape(
            "square ROI axes (T, R, R)",
            &[n_time, r1, r2],
        ));
    }

    let mut snapshots = Array3::<f64>::zeros((n_time, r1, r2));
    let mut report = NormalizationReport {
        timepoints: n_time,
        ..Default::default()
    };

    for (t, window) in raw.axis_iter(Axis(0)).enumerate() {
        let (dist, diag) = normalize_window(window, t);
        snapshots.index_axis_mut(Axis(0), t).assign(&dist);

        report.record(t, diag);
    }

    Ok(NormalizedSubject { snapshots, report })
}

/// Normalize one window; `timepoint` is only used in diagnostics
pub fn normalize_window(window: ArrayView2<f64>, timepoint: usize) -> (Array2<f64>, SnapshotDiagnostics) {
    let mut diag = SnapshotDiagnostics::default();

    let cleaned = window.mapv(|x| {
        if x.is_finite() {
            x
        } else {
            diag.nan_readings += 1;
            0.0
        }
    });

    let corr = pearson_columns(cleaned.view());
    let (dist, repairs) = correlation_to_snapshot(corr, timepoint);
    diag.nan_correlations = repairs.nan_correlations;
    diag.clipped_values = repairs.clipped_values;
    (dist, diag)
}

/// Repair a correlation matrix and map it to distances.
///
/// NaN entries become 0 and entries outside [-1, 1] are clipped; both are
/// counted in the returned diagnostics (`nan_readings` stays 0).
pub fn correlation_to_snapshot(
    mut corr: Array2<f64>,
    timepoint: usize,
) -> (Array2<f64>, SnapshotDiagnostics) {
    let mut diag = SnapshotDiagnostics::default();

    let nan_count = corr.iter().filter(|c| c.is_nan()).count();
    if nan_count > 0 {
        warn!(timepoint, count = nan_count, "NaN detected in correlation matrix, replacing with 0");
        corr.mapv_inplace(|c| if c.is_nan() { 0.0 } else { c });
        diag.nan_correlations = nan_count;
    }

    let out_of_range = corr.iter().filter(|c| **c < -1.0 || **c > 1.0).count();
    if out_of_range > 0 {
        warn!(timepoint, count = out_of_range, "Clipping correlation values to [-1, 1]");
        corr.mapv_inplace(|c| c.clamp(-1.0, 1.0));
        diag.clipped_values = out_of_range;
    }

    (corr.mapv(correlation_to_distance), diag)
}
