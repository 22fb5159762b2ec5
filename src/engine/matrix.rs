//! Symmetric, zero-diagonal dissimilarity matrix.

use ndarray::Array2;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{DfcError, Result};

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// T × T matrix of pairwise dissimilarities between timepoints.
///
/// Entries are only written through [`DissimilarityMatrix::set_pair`], so
/// symmetry and the zero diagonal hold by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DissimilarityMatrix {
    values: Array2<f64>,
}

impl DissimilarityMatrix {
    pub fn zeros(n_timepoints: usize) -> Self {
        Self {
            values: Array2::zeros((n_timepoints, n_timepoints)),
        }
    }

    /// Adopt an existing matrix after checking the invariants
    pub fn from_array(values: Array2<f64>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != cols {
            return Err(DfcError::InvalidInput(format!(
                "dissimilarity matrix must be square, got {}x{}",
                rows, cols
            )));
        }
        for i in 0..rows {
            if values[[i, i]] != 0.0 {
                return Err(DfcError::InvalidInput(format!(
                    "non-zero diagonal entry {} at {}",
                    values[[i, i]],
                    i
                )));
            }
            for j in 0..i {
                if values[[i, j]] != values[[j, i]] {
                    return Err(DfcError::InvalidInput(format!(
                        "asymmetric entries at ({}, {})",
                        i, j
                    )));
                }
            }
        }
        Ok(Self { values })
    }

    pub(crate) fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        debug_assert_ne!(i, j, "diagonal stays zero");
        self.values[[i, j]] = value;
        self.values[[j, i]] = value;
    }

    /// Number of timepoints
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_array(self) -> Array2<f64> {
        self.values
    }

    pub fn to_nested_vec(&self) -> Vec<Vec<f64>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| self.values[[i, i]] == 0.0 && (0..i).all(|j| self.values[[i, j]] == self.values[[j, i]]))
    }

    /// Mean of the strict upper triangle; 0 for fewer than two timepoints
    pub fn mean_off_diagonal(&self) -> f64 {
        let n = self.len();
        if n < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            for j in i + 1..n {
                sum += self.values[[i, j]];
            }
        }
        sum / (n * (n - 1) / 2) as f64
    }
}

/// Serialized as a JSON array of row arrays
impl Serialize for DissimilarityMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for row in self.values.outer_iter() {
            seq.serialize_element(&row.to_vec())?;
        }
        seq.end()
    }
}
