//! Barcodes: Finite Persistence Pairs of One Snapshot
//!
//! A barcode is a multiset of (birth, death) pairs. Order carries no
//! meaning, so comparisons go through [`Barcode::multiset_eq`] rather
//! than element-wise equality of the underlying vector.

use serde::{Deserialize, Serialize};

/// A persistence interval [birth, death)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistencePair {
    pub birth: f64,
    pub death: f64,
}

impl PersistencePair {
    pub fn new(birth: f64, death: f64) -> Self {
        Self { birth, death }
    }

    /// Lifetime of the feature
    pub fn persistence(&self) -> f64 {
        self.death - self.birth
    }

    /// Is this an essential feature (infinite persistence)?
    pub fn is_essential(&self) -> bool {
        self.death.is_infinite()
    }

    /// Cost of matching this point to the diagonal: half its persistence
    pub fn diagonal_cost(&self) -> f64 {
        0.5 * self.persistence()
    }
}

/// Degree-0 barcode of a snapshot (essential class removed)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Barcode {
    pairs: Vec<PersistencePair>,
}

impl Barcode {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(b, d)| PersistencePair::new(b, d))
                .collect(),
        }
    }

    pub fn push(&mut self, pair: PersistencePair) {
        self.pairs.push(pair);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[PersistencePair] {
        &self.pairs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PersistencePair> {
        self.pairs.iter()
    }

    /// Sum of lifetimes
    pub fn total_persistence(&self) -> f64 {
        self.pairs.iter().map(|p| p.persistence()).sum()
    }

    pub fn max_persistence(&self) -> f64 {
        self.pairs.iter().map(|p| p.persistence()).fold(0.0, f64::max)
    }

    /// Equality as multisets, up to `tolerance` per coordinate
    pub fn multiset_eq(&self, other: &Barcode, tolerance: f64) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let a = self.sorted_pairs();
        let b = other.sorted_pairs();
        a.iter().zip(b.iter()).all(|(p, q)| {
            (p.birth - q.birth).abs() <= tolerance && (p.death - q.death).abs() <= tolerance
        })
    }

    fn sorted_pairs(&self) -> Vec<PersistencePair> {
        let mut pairs = self.pairs.clone();
        pairs.sort_by(|p, q| p.birth.total_cmp(&q.birth).then(p.death.total_cmp(&q.death)));
        pairs
    }
}

impl<'a> IntoIterator for &'a Barcode {
    type Item = &'a PersistencePair;
    type IntoIter = std::slice::Iter<'a, PersistencePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
