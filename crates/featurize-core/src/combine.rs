//! Feature definitions and the interaction combiner.
//!
//! A [`FeatureDefinition`] names the namespaces whose values are combined
//! into one feature: a single namespace is a plain feature, two or more are
//! an interaction cross. The [`InteractionCombiner`] folds the hashed record
//! through all definitions into one [`SparseVector`] in a bounded hash space,
//! summing collisions.

use std::collections::{BTreeMap, HashMap};

use crate::audit::{AuditState, HashedFeatureName, RawFeatureName};
use crate::error::{FeaturizeError, Result};
use crate::hash::{self, FNV1_PRIME_32};
use crate::hashed_value::HashedValue;
use crate::record::NamespacedRecord;
use crate::schema::{FeatureSchema, NamespaceId, ValueType};
use crate::sparse::SparseVector;

/// Separator joining component names into a definition's display name.
const NAME_JOINER: &str = "^";

/// An unordered, non-empty set of namespaces defining one feature.
///
/// Components are stored sorted by slot id so the display name, and therefore
/// the definition's 32-bit namespace id, are reproducible regardless of the
/// order components were declared in.
///
/// At most one component may be declared [`ValueType::Numerical`]; crossing
/// two numerical namespaces is rejected at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDefinition {
    components: Vec<NamespaceId>,
    component_types: Vec<ValueType>,
    name: String,
    namespace_id: i32,
}

impl FeatureDefinition {
    /// Builds a definition from namespace names resolved against a schema.
    ///
    /// # Errors
    ///
    /// - [`FeaturizeError::EmptyFeatureDefinition`] for an empty component list.
    /// - [`FeaturizeError::UnknownNamespace`] if a name is not in the schema.
    /// - [`FeaturizeError::MultipleNumericalComponents`] if more than one
    ///   component is numerical.
    pub fn from_names<S: AsRef<str>>(schema: &FeatureSchema, names: &[S]) -> Result<Self> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(schema.resolve(name.as_ref())?);
        }
        Self::new(schema, ids)
    }

    /// Builds a definition from already-resolved slot ids.
    pub fn new(schema: &FeatureSchema, mut components: Vec<NamespaceId>) -> Result<Self> {
        if components.is_empty() {
            return Err(FeaturizeError::EmptyFeatureDefinition);
        }
        // Components form a set; order and duplicates carry no meaning.
        components.sort();
        components.dedup();

        let component_types: Vec<ValueType> =
            components.iter().map(|&id| schema.value_type(id)).collect();

        let name = components
            .iter()
            .map(|&id| schema.name(id))
            .collect::<Vec<_>>()
            .join(NAME_JOINER);

        let numerical = component_types
            .iter()
            .filter(|&&t| t == ValueType::Numerical)
            .count();
        if numerical > 1 {
            return Err(FeaturizeError::MultipleNumericalComponents {
                name,
                count: numerical,
            });
        }

        let namespace_id = hash::hash_string(&name);

        Ok(Self {
            components,
            component_types,
            name,
            namespace_id,
        })
    }

    /// The component slot ids, sorted.
    #[inline]
    pub fn components(&self) -> &[NamespaceId] {
        &self.components
    }

    /// The display name: component names joined with `^` in slot order.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stable 32-bit hash of the display name.
    #[inline]
    pub fn namespace_id(&self) -> i32 {
        self.namespace_id
    }

    /// Whether the combined feature carries numerical weights.
    pub fn value_type(&self) -> ValueType {
        if self.component_types.contains(&ValueType::Numerical) {
            ValueType::Numerical
        } else {
            ValueType::Categorical
        }
    }
}

/// Combines hashed records into sparse vectors in a `2^hash_bits` space.
///
/// One combiner instance serves one fixed-width model input: every vector it
/// produces lives in the same hash space. Contributions that land on the same
/// output index within one record are summed, never overwritten.
#[derive(Debug, Clone)]
pub struct InteractionCombiner {
    bit_mask: i32,
    definitions: Vec<FeatureDefinition>,
}

impl InteractionCombiner {
    /// Creates a combiner over `2^hash_bits` output indices.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturizeError::InvalidHashBits`] unless
    /// `1 <= hash_bits <= 32`.
    pub fn new(hash_bits: u32, definitions: Vec<FeatureDefinition>) -> Result<Self> {
        if hash_bits == 0 || hash_bits > 32 {
            return Err(FeaturizeError::InvalidHashBits { hash_bits });
        }
        let bit_mask = if hash_bits == 32 {
            -1
        } else {
            (1i32 << hash_bits) - 1
        };
        tracing::debug!(
            hash_bits,
            definitions = definitions.len(),
            "constructed interaction combiner"
        );
        Ok(Self {
            bit_mask,
            definitions,
        })
    }

    /// Returns the configured definitions.
    pub fn definitions(&self) -> &[FeatureDefinition] {
        &self.definitions
    }

    /// Constructs the feature vector for one hashed record.
    ///
    /// A constant bias feature is always emitted at index 0 with weight 1.0.
    /// Definitions whose components are absent from the record contribute
    /// nothing. Output entries are sorted by index, so identical inputs
    /// produce identical vectors.
    pub fn apply(&self, input: &NamespacedRecord<HashedValue>) -> SparseVector {
        let mut acc: BTreeMap<i32, f64> = BTreeMap::new();
        acc.insert(0, 1.0);

        for fd in &self.definitions {
            self.construct(fd, input, &mut acc, None);
        }

        into_vector(acc)
    }

    /// Like [`apply`](Self::apply), also resolving each output index back to
    /// the raw tokens that produced it, using hash-stage audit state.
    ///
    /// The returned map has no entry for the bias index 0 (unless a real
    /// feature collided onto it); callers report it as the dummy feature.
    pub fn apply_audited(
        &self,
        input: &NamespacedRecord<HashedValue>,
        audit: &AuditState,
    ) -> (SparseVector, HashMap<i32, Vec<RawFeatureName>>) {
        let mut acc: BTreeMap<i32, f64> = BTreeMap::new();
        acc.insert(0, 1.0);
        let mut sources: HashMap<i32, Vec<RawFeatureName>> = HashMap::new();

        for fd in &self.definitions {
            self.construct(fd, input, &mut acc, Some((audit, &mut sources)));
        }

        (into_vector(acc), sources)
    }

    fn construct(
        &self,
        fd: &FeatureDefinition,
        input: &NamespacedRecord<HashedValue>,
        acc: &mut BTreeMap<i32, f64>,
        mut audit: Option<(&AuditState, &mut HashMap<i32, Vec<RawFeatureName>>)>,
    ) {
        if let [component] = fd.components() {
            // Plain feature: one output entry per occurrence.
            let Some(value) = input.get(*component) else {
                return;
            };
            for (i, &el) in value.indices().iter().enumerate() {
                let index =
                    (fd.namespace_id().wrapping_mul(FNV1_PRIME_32) ^ hash::hash_i32(el))
                        & self.bit_mask;
                *acc.entry(index).or_insert(0.0) += value.weight_at(i);

                if let Some((state, sources)) = audit.as_mut() {
                    record_sources(state, sources, index, &[(*component, el)]);
                }
            }
        } else {
            self.interact(fd, input, acc, audit);
        }
    }

    /// Emits the full Cartesian product across the components' occurrences,
    /// enumerated in mixed radix.
    fn interact(
        &self,
        fd: &FeatureDefinition,
        input: &NamespacedRecord<HashedValue>,
        acc: &mut BTreeMap<i32, f64>,
        mut audit: Option<(&AuditState, &mut HashMap<i32, Vec<RawFeatureName>>)>,
    ) {
        let mut values = Vec::with_capacity(fd.components().len());
        let mut solutions: usize = 1;
        for &component in fd.components() {
            // If any component is missing, the cross does not fire.
            let Some(value) = input.get(component) else {
                return;
            };
            if value.indices().is_empty() {
                return;
            }
            solutions *= value.indices().len();
            values.push((component, value));
        }

        let mut combination = Vec::with_capacity(values.len());
        for i in 0..solutions {
            let mut j = 1;
            let mut h = fd.namespace_id();
            let mut weight = 1.0;
            combination.clear();

            for &(component, value) in &values {
                let set = value.indices();
                let pos = (i / j) % set.len();
                let el = set[pos];
                h ^= hash::hash_i32(el);
                h = h.wrapping_mul(FNV1_PRIME_32);
                weight *= value.weight_at(pos);
                j *= set.len();
                combination.push((component, el));
            }

            let index = h & self.bit_mask;
            *acc.entry(index).or_insert(0.0) += weight;

            if let Some((state, sources)) = audit.as_mut() {
                record_sources(state, sources, index, &combination);
            }
        }
    }
}

fn record_sources(
    state: &AuditState,
    sources: &mut HashMap<i32, Vec<RawFeatureName>>,
    index: i32,
    combination: &[(NamespaceId, i32)],
) {
    let resolved: Vec<RawFeatureName> = combination
        .iter()
        .filter_map(|&(namespace, hashed_index)| {
            state
                .lookup(&HashedFeatureName {
                    namespace,
                    hashed_index,
                })
                .cloned()
        })
        .collect();
    sources.insert(index, resolved);
}

fn into_vector(acc: BTreeMap<i32, f64>) -> SparseVector {
    let mut indices = Vec::with_capacity(acc.len());
    let mut values = Vec::with_capacity(acc.len());
    for (index, value) in acc {
        indices.push(index);
        values.push(value);
    }
    SparseVector::from_parts(indices, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueType;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            ("a".to_string(), ValueType::Categorical),
            ("b".to_string(), ValueType::Numerical),
            ("c".to_string(), ValueType::Categorical),
        ])
        .unwrap()
    }

    fn single_index(fd: &FeatureDefinition, el: i32, mask: i32) -> i32 {
        (fd.namespace_id().wrapping_mul(FNV1_PRIME_32) ^ hash::hash_i32(el)) & mask
    }

    fn weight_at(v: &SparseVector, index: i32) -> Option<f64> {
        v.iter().find(|&(i, _)| i == index).map(|(_, w)| w)
    }

    #[test]
    fn test_definition_name_order_independent() {
        let s = schema();
        let ac = FeatureDefinition::from_names(&s, &["a", "c"]).unwrap();
        let ca = FeatureDefinition::from_names(&s, &["c", "a"]).unwrap();
        assert_eq!(ac.name(), "a^c");
        assert_eq!(ac.namespace_id(), ca.namespace_id());
    }

    #[test]
    fn test_definition_rejects_empty_and_double_numerical() {
        let s = FeatureSchema::new(vec![
            ("x".to_string(), ValueType::Numerical),
            ("y".to_string(), ValueType::Numerical),
        ])
        .unwrap();

        assert!(matches!(
            FeatureDefinition::from_names::<&str>(&s, &[]),
            Err(FeaturizeError::EmptyFeatureDefinition)
        ));
        assert!(matches!(
            FeatureDefinition::from_names(&s, &["x", "y"]),
            Err(FeaturizeError::MultipleNumericalComponents { count: 2, .. })
        ));
    }

    #[test]
    fn test_definition_unknown_namespace_fails_at_construction() {
        let s = schema();
        assert!(matches!(
            FeatureDefinition::from_names(&s, &["a", "ghost"]),
            Err(FeaturizeError::UnknownNamespace { .. })
        ));
    }

    #[test]
    fn test_definition_with_one_numerical_component_allowed() {
        let s = schema();
        let fd = FeatureDefinition::from_names(&s, &["a", "b"]).unwrap();
        assert_eq!(fd.value_type(), ValueType::Numerical);
    }

    #[test]
    fn test_invalid_hash_bits() {
        assert!(matches!(
            InteractionCombiner::new(0, vec![]),
            Err(FeaturizeError::InvalidHashBits { hash_bits: 0 })
        ));
        assert!(matches!(
            InteractionCombiner::new(33, vec![]),
            Err(FeaturizeError::InvalidHashBits { hash_bits: 33 })
        ));
        assert!(InteractionCombiner::new(32, vec![]).is_ok());
    }

    #[test]
    fn test_bias_always_present() {
        let s = schema();
        let combiner = InteractionCombiner::new(8, vec![]).unwrap();
        let empty = NamespacedRecord::new(s.len());
        let v = combiner.apply(&empty);
        assert_eq!(v.indices(), &[0]);
        assert_eq!(v.values(), &[1.0]);
    }

    #[test]
    fn test_single_categorical_round_trip() {
        let s = schema();
        let fd = FeatureDefinition::from_names(&s, &["a"]).unwrap();
        let expected = single_index(&fd, 5, 255);
        let combiner = InteractionCombiner::new(8, vec![fd]).unwrap();

        let mut record = NamespacedRecord::new(s.len());
        record.put(s.resolve("a").unwrap(), HashedValue::single_categorical(5));

        let v = combiner.apply(&record);
        assert_eq!(v.len(), 2);
        assert_eq!(weight_at(&v, 0), Some(1.0));
        assert_eq!(weight_at(&v, expected), Some(1.0));

        // Bit-for-bit deterministic on re-run.
        assert_eq!(combiner.apply(&record), v);
    }

    #[test]
    fn test_single_numerical_carries_weight() {
        let s = schema();
        let fd = FeatureDefinition::from_names(&s, &["b"]).unwrap();
        let expected = single_index(&fd, 0, 255);
        let combiner = InteractionCombiner::new(8, vec![fd]).unwrap();

        let mut record = NamespacedRecord::new(s.len());
        record.put(s.resolve("b").unwrap(), HashedValue::single_numerical(2.25));

        let v = combiner.apply(&record);
        assert_eq!(weight_at(&v, expected), Some(2.25));
    }

    #[test]
    fn test_collisions_sum() {
        let s = schema();
        // Two occurrences of the same categorical id land on the same output
        // index; their unit weights must accumulate.
        let fd = FeatureDefinition::from_names(&s, &["a"]).unwrap();
        let expected = single_index(&fd, 9, 255);
        let combiner = InteractionCombiner::new(8, vec![fd]).unwrap();

        let mut record = NamespacedRecord::new(s.len());
        record.put(s.resolve("a").unwrap(), HashedValue::categoricals(vec![9, 9]));

        let v = combiner.apply(&record);
        assert_eq!(weight_at(&v, expected), Some(2.0));
    }

    #[test]
    fn test_cross_definition_collisions_sum() {
        let s = schema();
        let fd_a = FeatureDefinition::from_names(&s, &["a"]).unwrap();
        let fd_c = FeatureDefinition::from_names(&s, &["c"]).unwrap();
        // One hash bit leaves two possible indices, so the two features and
        // the bias must pile up instead of overwriting each other.
        let combiner = InteractionCombiner::new(1, vec![fd_a, fd_c]).unwrap();

        let mut record = NamespacedRecord::new(s.len());
        record.put(s.resolve("a").unwrap(), HashedValue::single_categorical(1));
        record.put(s.resolve("c").unwrap(), HashedValue::single_categorical(2));

        let v = combiner.apply(&record);
        let total: f64 = v.values().iter().sum();
        assert_eq!(total, 3.0);
        assert!(v.len() <= 2);
    }

    #[test]
    fn test_missing_component_contributes_nothing() {
        let s = schema();
        let cross = FeatureDefinition::from_names(&s, &["a", "c"]).unwrap();
        let combiner = InteractionCombiner::new(8, vec![cross]).unwrap();

        // "c" is absent: the cross must not fire, and that is not an error.
        let mut record = NamespacedRecord::new(s.len());
        record.put(s.resolve("a").unwrap(), HashedValue::single_categorical(1));

        let v = combiner.apply(&record);
        assert_eq!(v.indices(), &[0]);
    }

    #[test]
    fn test_cross_cartesian_product() {
        let s = schema();
        let cross = FeatureDefinition::from_names(&s, &["a", "c"]).unwrap();
        let combiner = InteractionCombiner::new(16, vec![cross.clone()]).unwrap();

        let mut record = NamespacedRecord::new(s.len());
        record.put(s.resolve("a").unwrap(), HashedValue::categoricals(vec![1, 2]));
        record.put(s.resolve("c").unwrap(), HashedValue::categoricals(vec![3, 4, 5]));

        let v = combiner.apply(&record);
        // 2 * 3 combinations plus bias, assuming no collisions at 16 bits.
        let total: f64 = v.values().iter().sum();
        assert_eq!(total, 7.0);
    }

    #[test]
    fn test_cross_with_numeric_component_multiplies_weights() {
        let s = schema();
        let cross = FeatureDefinition::from_names(&s, &["a", "b"]).unwrap();
        let combiner = InteractionCombiner::new(8, vec![cross.clone()]).unwrap();

        let mut record = NamespacedRecord::new(s.len());
        record.put(s.resolve("a").unwrap(), HashedValue::single_categorical(5));
        record.put(s.resolve("b").unwrap(), HashedValue::single_numerical(3.0));

        // Expected index: fold components in slot order into the cross id.
        let mut h = cross.namespace_id();
        h ^= hash::hash_i32(5);
        h = h.wrapping_mul(FNV1_PRIME_32);
        h ^= hash::hash_i32(0);
        h = h.wrapping_mul(FNV1_PRIME_32);
        let expected = h & 255;

        let v = combiner.apply(&record);
        assert_eq!(weight_at(&v, 0), Some(1.0));
        assert_eq!(weight_at(&v, expected), Some(3.0));
    }

    #[test]
    fn test_audited_apply_matches_plain_apply() {
        let s = schema();
        let fd = FeatureDefinition::from_names(&s, &["a"]).unwrap();
        let expected = single_index(&fd, 42, 255);
        let combiner = InteractionCombiner::new(8, vec![fd]).unwrap();

        let mut record = NamespacedRecord::new(s.len());
        record.put(s.resolve("a").unwrap(), HashedValue::single_categorical(42));

        let mut state = AuditState::new();
        state.register(
            s.resolve("a").unwrap(),
            &crate::raw_value::RawValue::single_categorical(42),
            &HashedValue::single_categorical(42),
        );

        let (v, sources) = combiner.apply_audited(&record, &state);
        assert_eq!(v, combiner.apply(&record));
        // Scalar integer ids report the index-0 slot, not the id itself.
        assert_eq!(sources[&expected][0].source_value, "0");
    }
}
