//! Vietoris-Rips Filtration (1-skeleton)
//!
//! For a distance matrix over R points, the Rips complex VR_ε contains:
//! - 0-simplices: every point, present from ε = 0
//! - 1-simplices: [i, j] once ε ≥ d(i, j)
//!
//! Only connected-component topology is needed downstream, so no
//! simplices above dimension 1 are ever built. The diagonal is never
//! read: a point's distance to itself says nothing about when it appears.

use ndarray::ArrayView2;

use crate::error::{DfcError, Result};

/// An edge with the filtration value at which it enters the complex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredEdge {
    pub u: usize,
    pub v: usize,
    pub filtration: f64,
}

/// Vertices and edges of a Rips complex, edges sorted by filtration value
#[derive(Debug, Clone)]
pub struct RipsFiltration {
    n_vertices: usize,
    edges: Vec<FilteredEdge>,
}

impl RipsFiltration {
    /// Build the filtration from a square distance matrix.
    ///
    /// Only the strict lower triangle is read, so a matrix with tiny
    /// asymmetries or a non-zero diagonal still yields a well-defined
    /// filtration.
    pub fn from_distance_matrix(distances: ArrayView2<f64>) -> Result<Self> {
        let (rows, cols) = distances.dim();
        if rows != cols {
            return Err(DfcError::MalformedDistanceMatrix(format!(
                "expected a square matrix, got {}x{}",
                rows, cols
            )));
        }
        let n = rows;

        let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 1..n {
            for j in 0..i {
                edges.push(FilteredEdge {
                    u: j,
                    v: i,
                    filtration: checked_entry(distances[[i, j]], i, j)?,
                });
            }
        }

        edges.sort_by(|a, b| {
            a.filtration
                .total_cmp(&b.filtration)
                .then(a.u.cmp(&b.u))
                .then(a.v.cmp(&b.v))
        });

        Ok(Self { n_vertices: n, edges })
    }

    /// Number of points
    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Edges in filtration order
    pub fn edges(&self) -> &[FilteredEdge] {
        &self.edges
    }

    /// Connected components of VR_ε
    pub fn count_components_at(&self, epsilon: f64) -> usize {
        let n = self.n_vertices();
        let mut uf = UnionFind::new(n);
        for e in self.edges.iter().take_while(|e| e.filtration <= epsilon) {
            uf.union(e.u, e.v);
        }
        (0..n)
            .filter(|&i| uf.find(i) == i)
            .count()
    }
}

fn checked_entry(value: f64, i: usize, j: usize) -> Result<f64> {
    if !value.is_finite() {
        return Err(DfcError::MalformedDistanceMatrix(format!(
            "non-finite entry {} at ({}, {})",
            value, i, j
        )));
    }
    if value < 0.0 {
        return Err(DfcError::MalformedDistanceMatrix(format!(
            "negative entry {} at ({}, {})",
            value, i, j
        )));
    }
    Ok(value)
}

/// Disjoint sets with path halving
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub(crate) fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Attach the root of `child` under the root of `root_of`
    pub(crate) fn attach(&mut self, child: usize, root_of: usize) {
        let c = self.find(child);
        let r = self.find(root_of);
        if c != r {
            self.parent[c] = r;
        }
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        self.attach(b, a);
    }
}
