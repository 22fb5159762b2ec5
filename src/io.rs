//! JSON I/O for subject tensors and dissimilarity matrices.
//!
//! Tensors are nested JSON arrays of any rank; the rank is checked later
//! by the normalizer, not here. `null` leaves are read as NaN so the
//! normalizer's NaN policy applies to missing readings. Matrices are
//! written one file per subject as `subject_{n}.json`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayD, IxDyn};
use serde_json::Value;

use crate::engine::DissimilarityMatrix;
use crate::error::{DfcError, Result};

/// File name used for subject `n` (1-based)
pub fn subject_file_name(subject: usize) -> String {
    format!("subject_{}.json", subject)
}

/// Read a nested numeric JSON array into a dynamic-rank tensor
pub fn read_tensor_json(path: impl AsRef<Path>) -> Result<ArrayD<f64>> {
    let raw = fs::read_to_string(path.as_ref())?;
    let value: Value = serde_json::from_str(&raw)?;
    tensor_from_value(&value)
}

/// Convert a parsed JSON value into a tensor, rejecting ragged nesting
pub fn tensor_from_value(value: &Value) -> Result<ArrayD<f64>> {
    let mut shape = Vec::new();
    let mut cursor = value;
    while let Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }

    let mut data = Vec::with_capacity(shape.iter().product());
    flatten(value, &shape, 0, &mut data)?;

    ArrayD::from_shape_vec(IxDyn(&shape), data)
        .map_err(|e| DfcError::InvalidInput(format!("tensor shape: {}", e)))
}

fn flatten(value: &Value, shape: &[usize], depth: usize, out: &mut Vec<f64>) -> Result<()> {
    if depth == shape.len() {
        let x = match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| DfcError::InvalidInput(format!("unrepresentable number {}", n)))?,
            Value::Null => f64::NAN,
            other => {
                return Err(DfcError::InvalidInput(format!(
                    "expected a number at depth {}, found {}",
                    depth, other
                )))
            }
        };
        out.push(x);
        return Ok(());
    }

    match value {
        Value::Array(items) if items.len() == shape[depth] => {
            for item in items {
                flatten(item, shape, depth + 1, out)?;
            }
            Ok(())
        }
        Value::Array(items) => Err(DfcError::InvalidInput(format!(
            "ragged array at depth {}: expected {} elements, found {}",
            depth,
            shape[depth],
            items.len()
        ))),
        _ => Err(DfcError::InvalidInput(format!(
            "expected an array at depth {}",
            depth
        ))),
    }
}

/// Write `subject_{n}.json` into `dir`, creating it if needed
pub fn write_matrix_json(
    dir: impl AsRef<Path>,
    subject: usize,
    matrix: &DissimilarityMatrix,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(subject_file_name(subject));
    let mut writer = BufWriter::new(fs::File::create(&path)?);
    serde_json::to_writer(&mut writer, matrix)?;
    writer.flush()?;
    Ok(path)
}

/// Read a matrix written by [`write_matrix_json`], re-checking its invariants
pub fn read_matrix_json(path: impl AsRef<Path>) -> Result<DissimilarityMatrix> {
    let raw = fs::read_to_string(path.as_ref())?;
    let rows: Vec<Vec<f64>> = serde_json::from_str(&raw)?;
    let n = rows.len();
    if let Some(bad) = rows.iter().position(|row| row.len() != n) {
        return Err(DfcError::InvalidInput(format!(
            "row {} has {} entries, expected {}",
            bad,
            rows[bad].len(),
            n
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let values = Array2::from_shape_vec((n, n), flat)
        .map_err(|e| DfcError::InvalidInput(format!("matrix shape: {}", e)))?;
    DissimilarityMatrix::from_array(values)
}
