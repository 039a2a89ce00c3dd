//! Sparse vector representation.
//!
//! The output of vectorization: parallel index/value arrays. Equality and
//! hashing are defined over the exact ordered contents of both arrays, so two
//! vectors holding the same entries in a different order are not equal.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::error::{FeaturizeError, Result};

/// A sparse vector of `(index, weight)` pairs.
///
/// # Examples
///
/// ```
/// use featurize_core::sparse::SparseVector;
///
/// let v = SparseVector::new(vec![0, 7], vec![1.0, 3.5]).unwrap();
/// assert_eq!(v.len(), 2);
///
/// // Indices-only construction implies all weights 1.0.
/// let w = SparseVector::from_indices(vec![0, 7]);
/// assert_eq!(w.values(), &[1.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<i32>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Creates a sparse vector from parallel index/value arrays.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::LengthMismatch`] if the arrays have
    /// different lengths. This is checked at construction, not at first use.
    pub fn new(indices: Vec<i32>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(FeaturizeError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        Ok(Self { indices, values })
    }

    /// Creates a sparse vector where every index carries weight 1.0.
    pub fn from_indices(indices: Vec<i32>) -> Self {
        let values = vec![1.0; indices.len()];
        Self { indices, values }
    }

    // Callers must have validated that the arrays are parallel.
    pub(crate) fn from_parts(indices: Vec<i32>, values: Vec<f64>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        Self { indices, values }
    }

    /// Returns the indices.
    #[inline]
    pub fn indices(&self) -> &[i32] {
        &self.indices
    }

    /// Returns the values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns whether the vector has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates over `(index, weight)` pairs in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.indices
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

// Hash over the ordered contents of both arrays, mirroring equality.
impl Hash for SparseVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.indices.hash(state);
        for v in &self.values {
            v.to_bits().hash(state);
        }
    }
}
