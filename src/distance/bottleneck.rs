//! Bottleneck distance between barcodes.
//!
//! The bottleneck distance is the smallest δ for which a perfect matching
//! of the augmented bipartite graph (points plus diagonal slots, as for
//! the Wasserstein case) uses only edges of cost ≤ δ. Point-to-point cost
//! is the L∞ distance, point-to-diagonal cost is half the persistence.
//!
//! δ is always one of the edge costs, so the search is a binary search
//! over the sorted distinct costs with a Hopcroft-Karp feasibility test.

use std::collections::VecDeque;

use super::BarcodeDistance;
use crate::topology::{Barcode, PersistencePair};

/// Worst-case matching distance
#[derive(Debug, Clone, Copy, Default)]
pub struct Bottleneck;

impl BarcodeDistance for Bottleneck {
    fn distance(&self, a: &Barcode, b: &Barcode) -> f64 {
        bottleneck_distance(a, b)
    }

    fn name(&self) -> &'static str {
        "bottleneck"
    }
}

/// Bottleneck distance with diagonal fallback
pub fn bottleneck_distance(a: &Barcode, b: &Barcode) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 0.0,
        (true, false) => return b.max_persistence() / 2.0,
        (false, true) => return a.max_persistence() / 2.0,
        (false, false) => {}
    }

    let graph = AugmentedGraph::new(a.pairs(), b.pairs());

    let mut candidates: Vec<f64> = graph.costs.clone();
    candidates.push(0.0);
    candidates.sort_by(f64::total_cmp);
    candidates.dedup();

    let (mut lo, mut hi) = (0usize, candidates.len() - 1);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if graph.has_perfect_matching(candidates[mid]) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    candidates[lo]
}

fn chebyshev(p: &PersistencePair, q: &PersistencePair) -> f64 {
    (p.birth - q.birth).abs().max((p.death - q.death).abs())
}

/// Dense bipartite graph over n + m left and n + m right vertices.
///
/// Left: A points then m diagonal slots. Right: B points then n diagonal
/// slots. `costs` is row-major; diagonal-to-diagonal edges cost 0.
struct AugmentedGraph {
    size: usize,
    costs: Vec<f64>,
}

impl AugmentedGraph {
    fn new(a: &[PersistencePair], b: &[PersistencePair]) -> Self {
        let n = a.len();
        let m = b.len();
        let size = n + m;
        let mut costs = vec![0.0; size * size];

        for (i, p) in a.iter().enumerate() {
            for (j, q) in b.iter().enumerate() {
                costs[i * size + j] = chebyshev(p, q);
            }
            for k in 0..n {
                costs[i * size + m + k] = p.diagonal_cost();
            }
        }
        for (j, q) in b.iter().enumerate() {
            for k in 0..m {
                costs[(n + k) * size + j] = q.diagonal_cost();
            }
        }

        Self { size, costs }
    }

    fn has_perfect_matching(&self, threshold: f64) -> bool {
        let adjacency: Vec<Vec<usize>> = (0..self.size)
            .map(|u| {
                (0..self.size)
                    .filter(|&v| self.costs[u * self.size + v] <= threshold)
                    .collect()
            })
            .collect();
        HopcroftKarp::new(&adjacency, self.size).max_matching() == self.size
    }
}

const UNMATCHED: usize = usize::MAX;

/// Maximum bipartite matching in O(E √V)
struct HopcroftKarp<'a> {
    adjacency: &'a [Vec<usize>],
    match_left: Vec<usize>,
    match_right: Vec<usize>,
    layer: Vec<usize>,
}

impl<'a> HopcroftKarp<'a> {
    fn new(adjacency: &'a [Vec<usize>], n_right: usize) -> Self {
        let n_left = adjacency.len();
        Self {
            adjacency,
            match_left: vec![UNMATCHED; n_left],
            match_right: vec![UNMATCHED; n_right],
            layer: vec![usize::MAX; n_left],
        }
    }

    fn max_matching(&mut self) -> usize {
        let mut matched = 0;
        while self.build_layers() {
            for u in 0..self.adjacency.len() {
                if self.match_left[u] == UNMATCHED && self.augment(u) {
                    matched += 1;
                }
            }
        }
        matched
    }

    /// BFS from free left vertices; true if some free right vertex is reachable
    fn build_layers(&mut self) -> bool {
        let mut queue = VecDeque::new();
        for u in 0..self.adjacency.len() {
            if self.match_left[u] == UNMATCHED {
                self.layer[u] = 0;
                queue.push_back(u);
            } else {
                self.layer[u] = usize::MAX;
            }
        }

        let mut found = false;
        while let Some(u) = queue.pop_front() {
            for &v in &self.adjacency[u] {
                let w = self.match_right[v];
                if w == UNMATCHED {
                    found = true;
                } else if self.layer[w] == usize::MAX {
                    self.layer[w] = self.layer[u] + 1;
                    queue.push_back(w);
                }
            }
        }
        found
    }

    fn augment(&mut self, u: usize) -> bool {
        for idx in 0..self.adjacency[u].len() {
            let v = self.adjacency[u][idx];
            let w = self.match_right[v];
            let advances = w == UNMATCHED
                || (self.layer[w] == self.layer[u].wrapping_add(1) && self.augment(w));
            if advances {
                self.match_left[u] = v;
                self.match_right[v] = u;
                return true;
            }
        }
        // Dead end for this phase
        self.layer[u] = usize::MAX;
        false
    }
}
