//! Error types for the featurize core library.
//!
//! This module defines the error types used throughout the featurize-core
//! crate, providing structured error handling with detailed context.

use thiserror::Error;

/// The main error type for featurize-core operations.
#[derive(Debug, Error)]
pub enum FeaturizeError {
    /// Error when a namespace name is declared more than once in a schema.
    #[error("Duplicate namespace in schema: {name}")]
    DuplicateNamespace {
        /// The name that was declared twice.
        name: String,
    },

    /// Error when a namespace name is not part of the schema.
    #[error("Unknown namespace: {name}")]
    UnknownNamespace {
        /// The name that could not be resolved.
        name: String,
    },

    /// Error when parallel index/value arrays have different lengths.
    #[error("Parallel array length mismatch: {indices} indices vs {values} values")]
    LengthMismatch {
        /// Number of indices (or names) provided.
        indices: usize,
        /// Number of values provided.
        values: usize,
    },

    /// Error when a typed accessor is called on a value of another shape.
    #[error("Value is of type {actual}, not {requested}")]
    TypeMismatch {
        /// The shape the value actually has.
        actual: &'static str,
        /// The shape the accessor requires.
        requested: &'static str,
    },

    /// Error when a feature definition has no components.
    #[error("A feature definition must have at least one component")]
    EmptyFeatureDefinition,

    /// Error when a feature cross contains more than one numerical namespace.
    #[error("Feature definition {name:?} has {count} numerical components; at most one is allowed")]
    MultipleNumericalComponents {
        /// The display name of the offending definition.
        name: String,
        /// How many numerical components were found.
        count: usize,
    },

    /// Error when the hash space configuration is out of range.
    #[error("hash_bits must be between 1 and 32, got {hash_bits}")]
    InvalidHashBits {
        /// The rejected value.
        hash_bits: u32,
    },

    /// Error when a required transformation is missing for a namespace.
    #[error("Missing transformations for required namespaces: {missing:?}")]
    MissingTransformations {
        /// Names of the namespaces with no registered transformation.
        missing: Vec<String>,
    },

    /// Error when a feature-state entry names a loader that is not registered.
    #[error("Unknown feature state loader {loader:?} for entry {name:?}")]
    UnknownFeatureStateLoader {
        /// The feature-state entry name.
        name: String,
        /// The unresolved loader identifier.
        loader: String,
    },

    /// Error when a feature-state entry has no parameter blob to load from.
    #[error("No parameter blob supplied for feature state {name:?}")]
    MissingFeatureStateBlob {
        /// The feature-state entry name.
        name: String,
    },

    /// Error when a feature-state blob fails to deserialize.
    #[error("Failed to load feature state {name:?}: {message}")]
    FeatureStateLoadFailed {
        /// The feature-state entry name.
        name: String,
        /// A description of the failure.
        message: String,
    },

    /// Error during configuration parsing or validation.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// A description of the configuration error.
        message: String,
    },
}

/// A specialized Result type for featurize-core operations.
pub type Result<T> = std::result::Result<T, FeaturizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeaturizeError::UnknownNamespace {
            name: "userAgent".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown namespace: userAgent");

        let err = FeaturizeError::LengthMismatch {
            indices: 1,
            values: 2,
        };
        assert_eq!(
            err.to_string(),
            "Parallel array length mismatch: 1 indices vs 2 values"
        );

        let err = FeaturizeError::TypeMismatch {
            actual: "SingleString",
            requested: "SingleNumerical",
        };
        assert_eq!(
            err.to_string(),
            "Value is of type SingleString, not SingleNumerical"
        );

        let err = FeaturizeError::InvalidHashBits { hash_bits: 33 };
        assert_eq!(err.to_string(), "hash_bits must be between 1 and 32, got 33");
    }
}
