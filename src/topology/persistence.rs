//! Degree-0 Persistent Homology
//!
//! On a 1-skeleton the only homology that can die is H0, and its
//! persistence pairs are given exactly by Kruskal's algorithm with the
//! elder rule:
//!
//! 1. Every vertex is born as its own component at 0.
//! 2. Edges are processed in filtration order.
//! 3. An edge joining two components kills one of them, producing the
//!    pair (0, edge filtration).
//! 4. Components still alive at the end are essential: (0, ∞).
//!
//! Pairs with zero persistence are not recorded.

use ndarray::ArrayView2;

use super::barcode::{Barcode, PersistencePair};
use super::vietoris_rips::{RipsFiltration, UnionFind};
use crate::error::Result;

/// Full H0 diagram, essential classes first
#[derive(Debug, Clone, Default)]
pub struct PersistenceDiagram {
    pub intervals: Vec<PersistencePair>,
}

impl PersistenceDiagram {
    pub fn n_essential(&self) -> usize {
        self.intervals.iter().filter(|p| p.is_essential()).count()
    }

    /// Finite intervals only
    pub fn finite_barcode(&self) -> Barcode {
        let mut barcode = Barcode::new();
        for pair in self.intervals.iter().filter(|p| !p.is_essential()) {
            barcode.push(*pair);
        }
        barcode
    }
}

/// Compute the H0 persistence diagram of a Rips filtration
pub fn compute_persistence(vr: &RipsFiltration) -> PersistenceDiagram {
    let n = vr.n_vertices();
    let mut uf = UnionFind::new(n);
    let mut finite = Vec::with_capacity(n.saturating_sub(1));

    for edge in vr.edges() {
        let ru = uf.find(edge.u);
        let rv = uf.find(edge.v);
        if ru == rv {
            continue;
        }

        // Every component is born at 0, so the elder rule reduces to
        // keeping the lower root index
        let (elder, younger) = if ru < rv { (ru, rv) } else { (rv, ru) };
        if edge.filtration > 0.0 {
            finite.push(PersistencePair::new(0.0, edge.filtration));
        }
        uf.attach(younger, elder);
    }

    let mut intervals = Vec::with_capacity(finite.len() + 1);
    for i in 0..n {
        if uf.find(i) == i {
            intervals.push(PersistencePair::new(0.0, f64::INFINITY));
        }
    }
    intervals.extend(finite);

    PersistenceDiagram { intervals }
}

/// Degree-0 barcode of a distance matrix, with the essential class dropped
pub fn degree0_barcode(distances: ArrayView2<f64>) -> Result<Barcode> {
    let vr = RipsFiltration::from_distance_matrix(distances)?;
    Ok(compute_persistence(&vr).finite_barcode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_window;
    use ndarray::{array, Array2};

    #[test]
    fn test_two_points() {
        let dm = array![[0.0, 1.0], [1.0, 0.0]];
        let vr = RipsFiltration::from_distance_matrix(dm.view()).unwrap();
        let pd = compute_persistence(&vr);

        assert_eq!(pd.n_essential(), 1);
        assert!(pd.intervals[0].is_essential());

        let barcode = pd.finite_barcode();
        assert_eq!(barcode.len(), 1);
        assert_eq!(barcode.pairs()[0], PersistencePair::new(0.0, 1.0));
    }

    #[test]
    fn test_deaths_are_mst_weights() {
        // MST of this metric: 0-2 (0.2), 2-1 (0.5), 1-3 (0.3)
        let dm = array![
            [0.0, 0.9, 0.2, 0.8],
            [0.9, 0.0, 0.5, 0.3],
            [0.2, 0.5, 0.0, 0.7],
            [0.8, 0.3, 0.7, 0.0]
        ];
        let barcode = degree0_barcode(dm.view()).unwrap();
        let expected = Barcode::from_pairs([(0.0, 0.2), (0.0, 0.3), (0.0, 0.5)]);
        assert!(barcode.multiset_eq(&expected, 1e-12));
    }

    #[test]
    fn test_all_zero_matrix_is_empty() {
        // Every point coincides: all merges happen at 0
        let zeros = Array2::<f64>::zeros((4, 4));
        assert!(degree0_barcode(zeros.view()).unwrap().is_empty());
    }

    #[test]
    fn test_equidistant_points() {
        let mut dm = Array2::<f64>::from_elem((5, 5), 0.7);
        dm.diag_mut().fill(0.0);
        let barcode = degree0_barcode(dm.view()).unwrap();
        let expected = Barcode::from_pairs([(0.0, 0.7); 4]);
        assert!(barcode.multiset_eq(&expected, 0.0));
    }

    #[test]
    fn test_flat_region_keeps_its_bar() {
        // Third region is constant over the window, so its correlations
        // are undefined and its self-distance normalizes to 1
        let window = array![[1.0, 2.0, 5.0], [2.0, 1.0, 5.0], [3.0, 4.0, 5.0]];
        let (snapshot, diag) = normalize_window(window.view(), 0);
        assert!(diag.nan_correlations > 0);
        assert_eq!(snapshot[[2, 2]], 1.0);

        let barcode = degree0_barcode(snapshot.view()).unwrap();
        assert_eq!(barcode.len(), 2);
        assert!(barcode.iter().any(|p| p.death == 1.0));

        let mut zero_diagonal = snapshot.clone();
        zero_diagonal.diag_mut().fill(0.0);
        assert!(barcode.multiset_eq(&degree0_barcode(zero_diagonal.view()).unwrap(), 0.0));
    }

    #[test]
    fn test_small_inputs() {
        let empty = Array2::<f64>::zeros((0, 0));
        let pd = compute_persistence(&RipsFiltration::from_distance_matrix(empty.view()).unwrap());
        assert_eq!(pd.n_essential(), 0);
        assert!(pd.finite_barcode().is_empty());

        let single = array![[0.0]];
        assert!(degree0_barcode(single.view()).unwrap().is_empty());
    }

    #[test]
    fn test_bar_count_matches_components() {
        let dm = array![
            [0.0, 0.9, 0.2, 0.8, 0.6],
            [0.9, 0.0, 0.5, 0.3, 0.4],
            [0.2, 0.5, 0.0, 0.7, 0.1],
            [0.8, 0.3, 0.7, 0.0, 0.9],
            [0.6, 0.4, 0.1, 0.9, 0.0]
        ];
        let vr = RipsFiltration::from_distance_matrix(dm.view()).unwrap();
        let barcode = compute_persistence(&vr).finite_barcode();
        for eps in [0.0, 0.15, 0.25, 0.35, 0.45, 1.0] {
            let alive = barcode.iter().filter(|p| p.death > eps).count();
            assert_eq!(alive + 1, vr.count_components_at(eps), "eps = {}", eps);
        }
    }

    #[test]
    fn test_permutation_invariant() {
        let dm = array![
            [0.0, 0.9, 0.2, 0.8],
            [0.9, 0.0, 0.5, 0.3],
            [0.2, 0.5, 0.0, 0.7],
            [0.8, 0.3, 0.7, 0.0]
        ];
        let perm = [3, 1, 0, 2];
        let permuted = Array2::from_shape_fn((4, 4), |(i, j)| dm[[perm[i], perm[j]]]);
        let a = degree0_barcode(dm.view()).unwrap();
        let b = degree0_barcode(permuted.view()).unwrap();
        assert!(a.multiset_eq(&b, 0.0));
    }
}
