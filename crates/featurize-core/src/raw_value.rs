//! Containers for feature values that may need hashing.
//!
//! A [`RawValue`] is set at construction and immutable thereafter. It carries
//! a lazily computed, memoized [`HashedValue`] so that a value shared across
//! multiple interaction crosses within one request is hashed once.

use once_cell::sync::OnceCell;

use crate::error::{FeaturizeError, Result};
use crate::hashed_value::HashedValue;

/// The shape of a [`RawValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawValueKind {
    SingleString,
    Strings,
    StringsToNumericals,
    SingleNumerical,
    SingleCategorical,
    Categoricals,
    CategoricalsToNumericals,
}

impl RawValueKind {
    fn name(self) -> &'static str {
        match self {
            RawValueKind::SingleString => "SingleString",
            RawValueKind::Strings => "Strings",
            RawValueKind::StringsToNumericals => "StringsToNumericals",
            RawValueKind::SingleNumerical => "SingleNumerical",
            RawValueKind::SingleCategorical => "SingleCategorical",
            RawValueKind::Categoricals => "Categoricals",
            RawValueKind::CategoricalsToNumericals => "CategoricalsToNumericals",
        }
    }
}

#[derive(Debug, Clone)]
enum Repr {
    SingleString(String),
    /// Ordered strings, implicit weight 1.0 each.
    Strings(Vec<String>),
    /// Parallel strings and weights.
    StringsToNumericals { names: Vec<String>, values: Vec<f64> },
    SingleNumerical(f64),
    /// A single already-integer id; never hashed.
    SingleCategorical(i32),
    /// Integer ids, implicit weight 1.0 each; never hashed.
    Categoricals(Vec<i32>),
    /// Parallel integer ids and weights; ids never hashed.
    CategoricalsToNumericals { names: Vec<i32>, values: Vec<f64> },
}

/// A pre-hash feature value.
///
/// # Examples
///
/// ```
/// use featurize_core::raw_value::{RawValue, RawValueKind};
///
/// let v = RawValue::single_string("mobile");
/// assert_eq!(v.kind(), RawValueKind::SingleString);
/// assert_eq!(v.as_single_string().unwrap(), "mobile");
/// assert!(v.as_single_numerical().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RawValue {
    repr: Repr,
    // Set-once memo; concurrent initialization is idempotent because hashing
    // is pure.
    hashed: OnceCell<HashedValue>,
}

impl RawValue {
    fn wrap(repr: Repr) -> Self {
        Self {
            repr,
            hashed: OnceCell::new(),
        }
    }

    /// A single string token.
    pub fn single_string(value: impl Into<String>) -> Self {
        Self::wrap(Repr::SingleString(value.into()))
    }

    /// An ordered list of string tokens, each with implicit weight 1.0.
    pub fn strings(values: Vec<String>) -> Self {
        Self::wrap(Repr::Strings(values))
    }

    /// Parallel string tokens and weights.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::LengthMismatch`] if the arrays differ in
    /// length.
    pub fn strings_to_numericals(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(FeaturizeError::LengthMismatch {
                indices: names.len(),
                values: values.len(),
            });
        }
        Ok(Self::wrap(Repr::StringsToNumericals { names, values }))
    }

    /// A single numerical value.
    pub fn single_numerical(value: f64) -> Self {
        Self::wrap(Repr::SingleNumerical(value))
    }

    /// A single already-integer categorical id.
    pub fn single_categorical(id: i32) -> Self {
        Self::wrap(Repr::SingleCategorical(id))
    }

    /// Integer categorical ids, each with implicit weight 1.0.
    pub fn categoricals(ids: Vec<i32>) -> Self {
        Self::wrap(Repr::Categoricals(ids))
    }

    /// Parallel integer ids and weights.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::LengthMismatch`] if the arrays differ in
    /// length.
    pub fn categoricals_to_numericals(names: Vec<i32>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(FeaturizeError::LengthMismatch {
                indices: names.len(),
                values: values.len(),
            });
        }
        Ok(Self::wrap(Repr::CategoricalsToNumericals { names, values }))
    }

    /// Returns the shape of this value.
    pub fn kind(&self) -> RawValueKind {
        match &self.repr {
            Repr::SingleString(_) => RawValueKind::SingleString,
            Repr::Strings(_) => RawValueKind::Strings,
            Repr::StringsToNumericals { .. } => RawValueKind::StringsToNumericals,
            Repr::SingleNumerical(_) => RawValueKind::SingleNumerical,
            Repr::SingleCategorical(_) => RawValueKind::SingleCategorical,
            Repr::Categoricals(_) => RawValueKind::Categoricals,
            Repr::CategoricalsToNumericals { .. } => RawValueKind::CategoricalsToNumericals,
        }
    }

    fn mismatch(&self, requested: &'static str) -> FeaturizeError {
        FeaturizeError::TypeMismatch {
            actual: self.kind().name(),
            requested,
        }
    }

    /// Returns the single string token.
    pub fn as_single_string(&self) -> Result<&str> {
        match &self.repr {
            Repr::SingleString(s) => Ok(s),
            _ => Err(self.mismatch("SingleString")),
        }
    }

    /// Returns the string tokens of `Strings` or `StringsToNumericals`.
    pub fn as_strings(&self) -> Result<&[String]> {
        match &self.repr {
            Repr::Strings(s) => Ok(s),
            Repr::StringsToNumericals { names, .. } => Ok(names),
            _ => Err(self.mismatch("Strings")),
        }
    }

    /// Returns the single numerical value.
    pub fn as_single_numerical(&self) -> Result<f64> {
        match &self.repr {
            Repr::SingleNumerical(v) => Ok(*v),
            _ => Err(self.mismatch("SingleNumerical")),
        }
    }

    /// Returns the single categorical id.
    pub fn as_single_categorical(&self) -> Result<i32> {
        match &self.repr {
            Repr::SingleCategorical(v) => Ok(*v),
            _ => Err(self.mismatch("SingleCategorical")),
        }
    }

    /// Returns the categorical ids of `Categoricals` or
    /// `CategoricalsToNumericals`.
    pub fn as_categoricals(&self) -> Result<&[i32]> {
        match &self.repr {
            Repr::Categoricals(ids) => Ok(ids),
            Repr::CategoricalsToNumericals { names, .. } => Ok(names),
            _ => Err(self.mismatch("Categoricals")),
        }
    }

    /// Returns the numerical weights of a weight-carrying variant.
    pub fn as_numericals(&self) -> Result<&[f64]> {
        match &self.repr {
            Repr::StringsToNumericals { values, .. } => Ok(values),
            Repr::CategoricalsToNumericals { values, .. } => Ok(values),
            _ => Err(self.mismatch("Numericals")),
        }
    }

    /// Returns the memoized hashed form, computing it on first access.
    ///
    /// The computation must be pure; concurrent callers may race to compute
    /// but exactly one result is stored and all callers observe it.
    pub fn hashed_or_compute<F>(&self, compute: F) -> &HashedValue
    where
        F: FnOnce() -> HashedValue,
    {
        self.hashed.get_or_init(compute)
    }

    /// Returns the memoized hashed form if it has been computed.
    pub fn cached_hashed(&self) -> Option<&HashedValue> {
        self.hashed.get()
    }

    /// The human-readable source token behind occurrence `i`, for audit.
    ///
    /// Scalar variants report `"0"` for their single slot, matching the
    /// index-0 storage convention.
    pub fn source_token(&self, i: usize) -> String {
        match &self.repr {
            Repr::SingleString(s) => s.clone(),
            Repr::Strings(s) => s[i].clone(),
            Repr::StringsToNumericals { names, .. } => names[i].clone(),
            Repr::SingleNumerical(_) => "0".to_string(),
            Repr::SingleCategorical(_) => "0".to_string(),
            Repr::Categoricals(ids) => ids[i].to_string(),
            Repr::CategoricalsToNumericals { names, .. } => names[i].to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_parallel_array_constructors_check_lengths() {
        let result = RawValue::strings_to_numericals(vec!["a".to_string()], vec![1.0, 2.0]);
        assert!(matches!(result, Err(FeaturizeError::LengthMismatch { .. })));

        let result = RawValue::categoricals_to_numericals(vec![1, 2], vec![1.0]);
        assert!(matches!(result, Err(FeaturizeError::LengthMismatch { .. })));
    }

    #[test]
    fn test_typed_accessors() {
        let v = RawValue::single_categorical(42);
        assert_eq!(v.as_single_categorical().unwrap(), 42);
        assert!(matches!(
            v.as_single_numerical(),
            Err(FeaturizeError::TypeMismatch {
                actual: "SingleCategorical",
                requested: "SingleNumerical",
            })
        ));
    }

    #[test]
    fn test_constructors_and_accessors_coexist() {
        // Factory and getter share a concept but not a name, per shape.
        let v = RawValue::single_string("ua");
        assert_eq!(v.as_single_string().unwrap(), "ua");
        assert!(v.as_strings().is_err());

        let v = RawValue::strings(vec!["a".to_string()]);
        assert_eq!(v.as_strings().unwrap(), &["a".to_string()]);

        let v = RawValue::single_numerical(1.5);
        assert_eq!(v.as_single_numerical().unwrap(), 1.5);

        let v = RawValue::categoricals(vec![3]);
        assert_eq!(v.as_categoricals().unwrap(), &[3]);
        assert!(v.as_numericals().is_err());
    }

    #[test]
    fn test_strings_accessor_covers_weighted_variant() {
        let v = RawValue::strings_to_numericals(
            vec!["x".to_string(), "y".to_string()],
            vec![1.0, 2.0],
        )
        .unwrap();
        assert_eq!(v.as_strings().unwrap().len(), 2);
        assert_eq!(v.as_numericals().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_hashed_memo_computed_once() {
        let v = RawValue::single_string("token");
        let calls = AtomicUsize::new(0);

        let first = v
            .hashed_or_compute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                HashedValue::single_categorical(7)
            })
            .clone();
        let second = v
            .hashed_or_compute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                HashedValue::single_categorical(8)
            })
            .clone();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(v.cached_hashed(), Some(&HashedValue::single_categorical(7)));
    }

    #[test]
    fn test_source_token() {
        assert_eq!(RawValue::single_string("ua").source_token(0), "ua");
        assert_eq!(RawValue::single_numerical(4.2).source_token(0), "0");
        // Scalar integer ids also report the slot, not the id.
        assert_eq!(RawValue::single_categorical(42).source_token(0), "0");
        assert_eq!(RawValue::categoricals(vec![10, 20]).source_token(1), "20");
    }
}
