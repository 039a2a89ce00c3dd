//! Containers for feature values after hashing.

use serde::{Deserialize, Serialize};

use crate::error::{FeaturizeError, Result};
use crate::sparse::SparseVector;

/// A feature value whose string content has already been hashed to indices.
///
/// Categorical values are index lists with implicit weight 1.0; numerical
/// values pair each index with a real-valued weight. A scalar feature (a
/// single value within its namespace) is stored at index 0 by convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HashedValue {
    /// Indices with implicit weight 1.0 each.
    Categorical(Vec<i32>),
    /// Parallel indices and weights.
    Numerical {
        /// Feature indices within the namespace.
        indices: Vec<i32>,
        /// The weight paired with each index.
        values: Vec<f64>,
    },
}

impl HashedValue {
    /// A single categorical index.
    pub fn single_categorical(index: i32) -> Self {
        HashedValue::Categorical(vec![index])
    }

    /// A list of categorical indices.
    pub fn categoricals(indices: Vec<i32>) -> Self {
        HashedValue::Categorical(indices)
    }

    /// A single numerical value, stored at index 0 by convention.
    pub fn single_numerical(value: f64) -> Self {
        HashedValue::Numerical {
            indices: vec![0],
            values: vec![value],
        }
    }

    /// Parallel indices and weights.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::LengthMismatch`] if the arrays differ in
    /// length.
    pub fn numericals(indices: Vec<i32>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(FeaturizeError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        Ok(HashedValue::Numerical { indices, values })
    }

    /// Returns the categorical indices.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::TypeMismatch`] for numerical values.
    pub fn categorical_indices(&self) -> Result<&[i32]> {
        match self {
            HashedValue::Categorical(indices) => Ok(indices),
            HashedValue::Numerical { .. } => Err(FeaturizeError::TypeMismatch {
                actual: "Numerical",
                requested: "Categorical",
            }),
        }
    }

    /// Returns the numerical indices.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::TypeMismatch`] for categorical values.
    pub fn numerical_indices(&self) -> Result<&[i32]> {
        match self {
            HashedValue::Numerical { indices, .. } => Ok(indices),
            HashedValue::Categorical(_) => Err(FeaturizeError::TypeMismatch {
                actual: "Categorical",
                requested: "Numerical",
            }),
        }
    }

    /// Returns the numerical weights.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::TypeMismatch`] for categorical values.
    pub fn numerical_values(&self) -> Result<&[f64]> {
        match self {
            HashedValue::Numerical { values, .. } => Ok(values),
            HashedValue::Categorical(_) => Err(FeaturizeError::TypeMismatch {
                actual: "Categorical",
                requested: "Numerical",
            }),
        }
    }

    /// Returns the indices regardless of shape.
    #[inline]
    pub fn indices(&self) -> &[i32] {
        match self {
            HashedValue::Categorical(indices) => indices,
            HashedValue::Numerical { indices, .. } => indices,
        }
    }

    /// Returns the weight at position `i`; categorical entries weigh 1.0.
    #[inline]
    pub fn weight_at(&self, i: usize) -> f64 {
        match self {
            HashedValue::Categorical(_) => 1.0,
            HashedValue::Numerical { values, .. } => values[i],
        }
    }

    /// Converts this value into its sparse-vector form.
    pub fn to_sparse_vector(&self) -> SparseVector {
        match self {
            HashedValue::Categorical(indices) => SparseVector::from_indices(indices.clone()),
            HashedValue::Numerical { indices, values } => {
                // Lengths were validated at construction.
                SparseVector::from_parts(indices.clone(), values.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_numerical_stored_at_index_zero() {
        let v = HashedValue::single_numerical(3.5);
        assert_eq!(v.numerical_indices().unwrap(), &[0]);
        assert_eq!(v.numerical_values().unwrap(), &[3.5]);
    }

    #[test]
    fn test_numericals_length_check() {
        let result = HashedValue::numericals(vec![1, 2], vec![1.0]);
        assert!(matches!(result, Err(FeaturizeError::LengthMismatch { .. })));
    }

    #[test]
    fn test_wrong_accessor_fails() {
        let cat = HashedValue::categoricals(vec![1, 2]);
        assert!(matches!(
            cat.numerical_values(),
            Err(FeaturizeError::TypeMismatch { .. })
        ));

        let num = HashedValue::single_numerical(1.0);
        assert!(matches!(
            num.categorical_indices(),
            Err(FeaturizeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_weight_at() {
        let cat = HashedValue::categoricals(vec![7, 8]);
        assert_eq!(cat.weight_at(0), 1.0);
        assert_eq!(cat.weight_at(1), 1.0);

        let num = HashedValue::numericals(vec![7, 8], vec![0.25, 4.0]).unwrap();
        assert_eq!(num.weight_at(1), 4.0);
    }

    #[test]
    fn test_to_sparse_vector() {
        let num = HashedValue::numericals(vec![3], vec![9.0]).unwrap();
        let sv = num.to_sparse_vector();
        assert_eq!(sv.indices(), &[3]);
        assert_eq!(sv.values(), &[9.0]);

        let cat = HashedValue::categoricals(vec![4, 5]);
        assert_eq!(cat.to_sparse_vector().values(), &[1.0, 1.0]);
    }
}
