//! Pearson correlation between the columns of a window.

use ndarray::{Array2, ArrayView2, Axis};

/// Column-wise Pearson correlation matrix.
///
/// Rows are observations, columns are variables (regions). A column with
/// zero variance correlates as NaN with everything, itself included; callers
/// decide how to repair that. Off-diagonal values are left unclipped so that
/// floating-point drift past ±1 remains observable.
pub fn pearson_columns(window: ArrayView2<f64>) -> Array2<f64> {
    let n_vars = window.ncols();
    let mut corr = Array2::<f64>::zeros((n_vars, n_vars));
    let means = match window.mean_axis(Axis(0)) {
        Some(means) => means,
        None => {
            // No observations: every correlation is undefined
            corr.fill(f64::NAN);
            return corr;
        }
    };
    let centered = &window - &means;

    // Sum of squared deviations per column
    let ss: Vec<f64> = centered
        .axis_iter(Axis(1))
        .map(|col| col.dot(&col))
        .collect();

    for a in 0..n_vars {
        let col_a = centered.column(a);
        for b in a..n_vars {
            let value = if a == b {
                if ss[a] > 0.0 { 1.0 } else { f64::NAN }
            } else {
                let num = col_a.dot(&centered.column(b));
                num / (ss[a] * ss[b]).sqrt()
            };
            corr[[a, b]] = value;
            corr[[b, a]] = value;
        }
    }

    corr
}
