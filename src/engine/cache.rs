//! Per-subject signature cache.
//!
//! An arena indexed by timepoint, sized once to T. A slot is filled on
//! first use and never recomputed, which bounds extraction calls to T.

use crate::error::Result;

#[derive(Debug)]
pub struct SignatureCache<S> {
    slots: Vec<Option<S>>,
    filled: usize,
}

impl<S> SignatureCache<S> {
    pub fn new(n_timepoints: usize) -> Self {
        let mut slots = Vec::with_capacity(n_timepoints);
        slots.resize_with(n_timepoints, || None);
        Self { slots, filled: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots computed so far
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn contains(&self, timepoint: usize) -> bool {
        matches!(self.slots.get(timepoint), Some(Some(_)))
    }

    /// Fill `timepoint` with `compute()` unless already present.
    ///
    /// Returns true if `compute` ran.
    pub fn ensure<F>(&mut self, timepoint: usize, compute: F) -> Result<bool>
    where
        F: FnOnce() -> Result<S>,
    {
        let slot = &mut self.slots[timepoint];
        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(compute()?);
        self.filled += 1;
        Ok(true)
    }

    pub fn get(&self, timepoint: usize) -> Option<&S> {
        self.slots.get(timepoint).and_then(Option::as_ref)
    }
}
