//! The extraction stage: domain records to namespaced raw values.
//!
//! Transformations are domain code supplied by the caller, one per namespace.
//! A [`RecordTransformer`] runs only the transformations the configured
//! feature definitions actually reference, so unused namespaces cost nothing.

use std::collections::HashMap;

use crate::error::{FeaturizeError, Result};
use crate::raw_value::RawValue;
use crate::record::NamespacedRecord;
use crate::schema::{FeatureSchema, NamespaceId};

/// Extracts one namespace's raw value from a domain record.
///
/// Returning `None` means the record has no value for the namespace, which is
/// normal and leaves the slot empty.
pub type Transformation<R> = Box<dyn Fn(&R) -> Option<RawValue> + Send + Sync>;

/// Caller-supplied transformations keyed by namespace name.
#[derive(Default)]
pub struct TransformationRegistry<R> {
    by_name: HashMap<String, Transformation<R>>,
}

impl<R> TransformationRegistry<R> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Registers a transformation for a namespace name, replacing any
    /// previous registration under the same name.
    pub fn register<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&R) -> Option<RawValue> + Send + Sync + 'static,
    {
        self.by_name.insert(name.into(), Box::new(f));
        self
    }

    /// Returns the number of registered transformations.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn take(&mut self, name: &str) -> Option<Transformation<R>> {
        self.by_name.remove(name)
    }
}

/// Applies the transformations for a fixed set of required namespaces.
pub struct RecordTransformer<R> {
    universe_size: usize,
    transformations: Vec<(NamespaceId, Transformation<R>)>,
}

impl<R> RecordTransformer<R> {
    /// Builds a transformer covering exactly `required` namespaces.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::MissingTransformations`] naming every
    /// required namespace the registry has no transformation for. Extra
    /// registrations for namespaces outside `required` are dropped.
    pub fn new(
        schema: &FeatureSchema,
        required: &[NamespaceId],
        mut registry: TransformationRegistry<R>,
    ) -> Result<Self> {
        let mut ids: Vec<NamespaceId> = required.to_vec();
        ids.sort();
        ids.dedup();

        let mut transformations = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match registry.take(schema.name(id)) {
                Some(f) => transformations.push((id, f)),
                None => missing.push(schema.name(id).to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(FeaturizeError::MissingTransformations { missing });
        }

        Ok(Self {
            universe_size: schema.len(),
            transformations,
        })
    }

    /// Extracts the raw record for one domain record.
    ///
    /// Transformations returning `None` leave their slot empty; downstream
    /// stages treat the namespace as absent.
    pub fn apply(&self, record: &R) -> NamespacedRecord<RawValue> {
        let mut out = NamespacedRecord::new(self.universe_size);
        for (id, f) in &self.transformations {
            if let Some(value) = f(record) {
                out.put(*id, value);
            }
        }
        out
    }

    /// The namespaces this transformer fills, sorted by slot id.
    pub fn covered(&self) -> impl Iterator<Item = NamespaceId> + '_ {
        self.transformations.iter().map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueType;

    struct Request {
        device: Option<String>,
        bid: f64,
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            ("device".to_string(), ValueType::Categorical),
            ("bid".to_string(), ValueType::Numerical),
            ("unused".to_string(), ValueType::Categorical),
        ])
        .unwrap()
    }

    fn registry() -> TransformationRegistry<Request> {
        TransformationRegistry::new()
            .register("device", |r: &Request| {
                r.device.clone().map(RawValue::single_string)
            })
            .register("bid", |r: &Request| Some(RawValue::single_numerical(r.bid)))
    }

    #[test]
    fn test_applies_only_required_namespaces() {
        let s = schema();
        let required = [s.resolve("device").unwrap()];
        let transformer = RecordTransformer::new(&s, &required, registry()).unwrap();

        let record = transformer.apply(&Request {
            device: Some("ios".to_string()),
            bid: 1.5,
        });
        assert_eq!(record.len(), 1);
        assert!(record.get(s.resolve("bid").unwrap()).is_none());
    }

    #[test]
    fn test_none_leaves_slot_empty() {
        let s = schema();
        let required = [s.resolve("device").unwrap(), s.resolve("bid").unwrap()];
        let transformer = RecordTransformer::new(&s, &required, registry()).unwrap();

        let record = transformer.apply(&Request {
            device: None,
            bid: 0.25,
        });
        assert!(record.get(s.resolve("device").unwrap()).is_none());
        assert!(record.get(s.resolve("bid").unwrap()).is_some());
    }

    #[test]
    fn test_missing_transformations_listed() {
        let s = schema();
        let required = [s.resolve("device").unwrap(), s.resolve("unused").unwrap()];
        let result = RecordTransformer::new(&s, &required, registry());
        match result {
            Err(FeaturizeError::MissingTransformations { missing }) => {
                assert_eq!(missing, vec!["unused".to_string()]);
            }
            other => panic!("expected MissingTransformations, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_duplicate_required_ids_collapse() {
        let s = schema();
        let device = s.resolve("device").unwrap();
        let transformer = RecordTransformer::new(&s, &[device, device], registry()).unwrap();
        assert_eq!(transformer.covered().count(), 1);
    }
}
