//! Feature schema: the closed namespace universe for one use case.
//!
//! A [`FeatureSchema`] is an ordered list of `(name, ValueType)` pairs fixed
//! at build time. Namespace references are resolved once into dense
//! [`NamespaceId`] slot ids, so records and the combiner get O(1) access
//! without a per-lookup string hash.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FeaturizeError, Result};

/// The declared type of the values attached to a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    /// Indices with implicit weight 1.0.
    Categorical,
    /// Indices paired with real-valued weights.
    Numerical,
}

/// A dense slot id identifying one namespace within its schema.
///
/// Ids are only meaningful for the [`FeatureSchema`] that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamespaceId(pub(crate) usize);

impl NamespaceId {
    /// Returns the raw slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The closed, enumerable namespace universe for one use case.
///
/// # Examples
///
/// ```
/// use featurize_core::schema::{FeatureSchema, ValueType};
///
/// let schema = FeatureSchema::new(vec![
///     ("user_id".to_string(), ValueType::Categorical),
///     ("watch_time".to_string(), ValueType::Numerical),
/// ]).unwrap();
///
/// let id = schema.resolve("watch_time").unwrap();
/// assert_eq!(schema.value_type(id), ValueType::Numerical);
/// assert_eq!(schema.name(id), "watch_time");
/// ```
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
    value_types: Vec<ValueType>,
    by_name: HashMap<String, NamespaceId>,
}

impl FeatureSchema {
    /// Builds a schema from an ordered list of `(name, value_type)` pairs.
    ///
    /// Slot ids are assigned in declaration order. Duplicate names are
    /// rejected.
    pub fn new(namespaces: Vec<(String, ValueType)>) -> Result<Self> {
        let mut names = Vec::with_capacity(namespaces.len());
        let mut value_types = Vec::with_capacity(namespaces.len());
        let mut by_name = HashMap::with_capacity(namespaces.len());

        for (i, (name, value_type)) in namespaces.into_iter().enumerate() {
            if by_name.insert(name.clone(), NamespaceId(i)).is_some() {
                return Err(FeaturizeError::DuplicateNamespace { name });
            }
            names.push(name);
            value_types.push(value_type);
        }

        Ok(Self {
            names,
            value_types,
            by_name,
        })
    }

    /// Resolves a namespace name to its slot id.
    pub fn resolve(&self, name: &str) -> Result<NamespaceId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| FeaturizeError::UnknownNamespace {
                name: name.to_string(),
            })
    }

    /// Returns the name of the given namespace.
    #[inline]
    pub fn name(&self, id: NamespaceId) -> &str {
        &self.names[id.0]
    }

    /// Returns the declared value type of the given namespace.
    #[inline]
    pub fn value_type(&self, id: NamespaceId) -> ValueType {
        self.value_types[id.0]
    }

    /// Returns the number of namespaces in this schema.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether the schema declares no namespaces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over all slot ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = NamespaceId> + '_ {
        (0..self.names.len()).map(NamespaceId)
    }
}
