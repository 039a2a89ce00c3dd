//! Provenance tracking for hashed features.
//!
//! When auditing is enabled, the hashing stage records which human-readable
//! token produced each hashed index, and the combiner resolves final output
//! indices back to those tokens. Audit state is an explicit per-call value,
//! so the disabled path costs nothing and enabled state never leaks across
//! threads or requests.

use serde::Serialize;
use std::collections::HashMap;

use crate::hashed_value::HashedValue;
use crate::raw_value::RawValue;
use crate::schema::{FeatureSchema, NamespaceId};

/// Separator used when several names or tokens collapse into one entry.
pub const AUDIT_JOINER: &str = "^";

/// Name reported for the constant bias feature at index 0.
pub const DUMMY_FEATURE: &str = "dummy";

/// A human-readable source token attached to its namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFeatureName {
    /// The namespace the token was attached to.
    pub namespace: NamespaceId,
    /// The original raw token.
    pub source_value: String,
}

/// A hashed per-namespace index, the key under which provenance is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashedFeatureName {
    /// The namespace the index belongs to.
    pub namespace: NamespaceId,
    /// The hashed (or passed-through) index within the namespace.
    pub hashed_index: i32,
}

/// Hash-stage audit state: hashed index -> source token, per namespace.
#[derive(Debug, Default)]
pub struct AuditState {
    by_feature: HashMap<HashedFeatureName, RawFeatureName>,
}

impl AuditState {
    /// Creates empty audit state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the source tokens behind every index of a hashed value.
    pub fn register(&mut self, namespace: NamespaceId, raw: &RawValue, hashed: &HashedValue) {
        for (i, &index) in hashed.indices().iter().enumerate() {
            self.by_feature.insert(
                HashedFeatureName {
                    namespace,
                    hashed_index: index,
                },
                RawFeatureName {
                    namespace,
                    source_value: raw.source_token(i),
                },
            );
        }
    }

    /// Looks up the source token behind a hashed index.
    pub fn lookup(&self, name: &HashedFeatureName) -> Option<&RawFeatureName> {
        self.by_feature.get(name)
    }

    /// Discards all recorded provenance, keeping allocations.
    pub fn clear(&mut self) {
        self.by_feature.clear();
    }

    /// Returns the number of recorded entries.
    pub fn len(&self) -> usize {
        self.by_feature.len()
    }

    /// Returns whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.by_feature.is_empty()
    }
}

/// One audited row of a final output vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    /// Output index in the combined hash space.
    pub index: i32,
    /// Accumulated weight at the index.
    pub value: f64,
    /// Namespace display name(s), joined with [`AUDIT_JOINER`].
    pub feature_namespace: String,
    /// Source token(s), joined with [`AUDIT_JOINER`].
    pub feature_name: String,
}

impl AuditEntry {
    /// Builds an entry from the provenance chain behind one output index.
    ///
    /// An empty chain is the synthetic bias feature and is reported as
    /// [`DUMMY_FEATURE`].
    pub fn from_sources(
        schema: &FeatureSchema,
        index: i32,
        value: f64,
        sources: &[RawFeatureName],
    ) -> Self {
        if sources.is_empty() {
            return Self {
                index,
                value,
                feature_namespace: DUMMY_FEATURE.to_string(),
                feature_name: DUMMY_FEATURE.to_string(),
            };
        }
        let feature_namespace = sources
            .iter()
            .map(|s| schema.name(s.namespace))
            .collect::<Vec<_>>()
            .join(AUDIT_JOINER);
        let feature_name = sources
            .iter()
            .map(|s| s.source_value.as_str())
            .collect::<Vec<_>>()
            .join(AUDIT_JOINER);
        Self {
            index,
            value,
            feature_namespace,
            feature_name,
        }
    }
}
