//! Distance Module: Comparing Snapshots and Barcodes
//!
//! Two families of distance are used between timepoints:
//!
//! - **Barcode metrics** (topological pipeline): order-1 Wasserstein and
//!   bottleneck distances between degree-0 barcodes. Both treat the
//!   diagonal birth = death as an unlimited sink, so barcodes of
//!   different sizes (including empty ones) compare cleanly.
//! - **Frobenius norm** (traditional pipeline): ‖A − B‖_F between the
//!   normalized snapshots themselves.

mod bottleneck;
mod hungarian;
mod wasserstein;

pub use bottleneck::{bottleneck_distance, Bottleneck};
pub use wasserstein::{diagonal_mass, wasserstein_distance, Wasserstein};

use ndarray::{ArrayView2, Zip};

use crate::config::Metric;
use crate::topology::Barcode;

/// A distance between two barcodes
pub trait BarcodeDistance {
    fn distance(&self, a: &Barcode, b: &Barcode) -> f64;

    /// Identifier used in logs
    fn name(&self) -> &'static str;
}

impl BarcodeDistance for Metric {
    fn distance(&self, a: &Barcode, b: &Barcode) -> f64 {
        barcode_distance(a, b, *self)
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

/// Dispatch on the configured metric
pub fn barcode_distance(a: &Barcode, b: &Barcode, metric: Metric) -> f64 {
    match metric {
        Metric::OptimalTransport => wasserstein_distance(a, b),
        Metric::Bottleneck => bottleneck_distance(a, b),
    }
}

/// Frobenius norm of the difference of two equally shaped matrices
///
/// # Panics
/// If the shapes differ. Snapshots of one subject always share a shape.
pub fn frobenius_distance(a: ArrayView2<f64>, b: ArrayView2<f64>) -> f64 {
    Zip::from(&a)
        .and(&b)
        .fold(0.0, |acc, &x, &y| acc + (x - y) * (x - y))
        .sqrt()
}
