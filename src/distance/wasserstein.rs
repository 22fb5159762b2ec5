//! Order-1 Wasserstein distance between barcodes.
//!
//! Two barcodes A (n points) and B (m points) are compared through an
//! (n + m) × (n + m) assignment problem:
//!
//! ```text
//!               B points        diagonal slots (n)
//! A points   [ ‖a - b‖₂      |  diag(a)          ]
//! diag (m)   [ diag(b)       |  0                ]
//! ```
//!
//! where diag(p) = (death - birth) / 2. Every point is either matched
//! to a point of the other barcode or retired to the diagonal.

use ndarray::Array2;

use super::hungarian::solve_assignment;
use super::BarcodeDistance;
use crate::topology::{Barcode, PersistencePair};

/// Order-1 optimal transport with a Euclidean ground metric
#[derive(Debug, Clone, Copy, Default)]
pub struct Wasserstein;

impl BarcodeDistance for Wasserstein {
    fn distance(&self, a: &Barcode, b: &Barcode) -> f64 {
        wasserstein_distance(a, b)
    }

    fn name(&self) -> &'static str {
        "optimal_transport"
    }
}

/// Order-1 Wasserstein distance with diagonal sink
pub fn wasserstein_distance(a: &Barcode, b: &Barcode) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 0.0,
        (true, false) => return diagonal_mass(b),
        (false, true) => return diagonal_mass(a),
        (false, false) => {}
    }

    let cost = augmented_cost(a.pairs(), b.pairs());
    solve_assignment(&cost).total_cost
}

/// Cost of sending every point of `barcode` to the diagonal
pub fn diagonal_mass(barcode: &Barcode) -> f64 {
    barcode.iter().map(|p| p.diagonal_cost()).sum()
}

fn augmented_cost(a: &[PersistencePair], b: &[PersistencePair]) -> Array2<f64> {
    let n = a.len();
    let m = b.len();
    let size = n + m;
    let mut cost = Array2::<f64>::zeros((size, size));

    for (i, p) in a.iter().enumerate() {
        for (j, q) in b.iter().enumerate() {
            cost[[i, j]] = euclidean(p, q);
        }
        let to_diagonal = p.diagonal_cost();
        for k in 0..n {
            cost[[i, m + k]] = to_diagonal;
        }
    }
    for (j, q) in b.iter().enumerate() {
        let to_diagonal = q.diagonal_cost();
        for k in 0..m {
            cost[[n + k, j]] = to_diagonal;
        }
    }

    cost
}

fn euclidean(p: &PersistencePair, q: &PersistencePair) -> f64 {
    (p.birth - q.birth).hypot(p.death - q.death)
}
