//! Core feature-engineering pipeline for featurize.
//!
//! This crate turns arbitrary domain records into sparse feature vectors in a
//! bounded hash space, deterministically, through three stages:
//!
//! - **Transform**: caller-supplied per-namespace functions extract
//!   [`RawValue`]s from a domain record.
//! - **Hash**: string tokens are hashed to 32-bit indices with a fixed,
//!   platform-independent hash; integer ids pass through unhashed.
//! - **Combine**: configured feature definitions, including interaction
//!   crosses between namespaces, are folded into one [`SparseVector`] of
//!   `2^hash_bits` possible indices, summing collisions.
//!
//! Identical input always produces an identical vector, on every platform and
//! run, so vectors computed at training time match the ones computed when
//! serving the trained model.
//!
//! # Example
//!
//! ```
//! use featurize_core::config::VectorizerConfig;
//! use featurize_core::raw_value::RawValue;
//! use featurize_core::schema::{FeatureSchema, ValueType};
//! use featurize_core::transform::TransformationRegistry;
//! use featurize_core::vectorizer::VectorizerBuilder;
//!
//! struct Click { referrer: String }
//!
//! let schema = FeatureSchema::new(vec![
//!     ("referrer".to_string(), ValueType::Categorical),
//! ]).unwrap();
//! let config = VectorizerConfig {
//!     hash_bits: 18,
//!     features: vec![vec!["referrer".to_string()]],
//!     feature_states: vec![],
//! };
//! let vectorizer = VectorizerBuilder::new(schema, config)
//!     .transformations(TransformationRegistry::new().register(
//!         "referrer",
//!         |c: &Click| Some(RawValue::single_string(c.referrer.clone())),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let vector = vectorizer.apply(&Click { referrer: "search".to_string() });
//! assert_eq!(vector.indices()[0], 0); // constant bias feature
//! assert_eq!(vector.len(), 2);
//! ```
//!
//! # Modules
//!
//! - [`schema`]: namespace declarations and the closed key universe.
//! - [`raw_value`] / [`hashed_value`] / [`sparse`]: the value data model.
//! - [`record`]: per-record namespace-to-value maps.
//! - [`hash`] / [`hasher`]: the hashing stage.
//! - [`combine`]: feature definitions and the interaction combiner.
//! - [`transform`]: the domain-code seam.
//! - [`vectorizer`] / [`config`] / [`feature_state`]: pipeline assembly.
//! - [`audit`]: provenance from output index back to raw tokens.
//! - [`error`]: error types for the library.

pub mod audit;
pub mod combine;
pub mod config;
pub mod error;
pub mod feature_state;
pub mod hash;
pub mod hashed_value;
pub mod hasher;
pub mod raw_value;
pub mod record;
pub mod schema;
pub mod sparse;
pub mod transform;
pub mod vectorizer;

// Re-export commonly used types at the crate root for convenience
pub use audit::{AuditEntry, AuditState, DUMMY_FEATURE};
pub use combine::{FeatureDefinition, InteractionCombiner};
pub use config::{FeatureStateEntry, VectorizerConfig};
pub use error::{FeaturizeError, Result};
pub use feature_state::{FeatureState, FeatureStateLoaderRegistry, FeatureStates};
pub use hasher::Hasher;
pub use hashed_value::HashedValue;
pub use raw_value::{RawValue, RawValueKind};
pub use record::NamespacedRecord;
pub use schema::{FeatureSchema, NamespaceId, ValueType};
pub use sparse::SparseVector;
pub use transform::{RecordTransformer, Transformation, TransformationRegistry};
pub use vectorizer::{Vectorizer, VectorizerBuilder};
