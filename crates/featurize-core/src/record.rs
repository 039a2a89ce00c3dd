//! Namespaced records: one value slot per schema namespace.
//!
//! A [`NamespacedRecord`] maps [`NamespaceId`]s to values over the closed key
//! universe of one [`FeatureSchema`](crate::schema::FeatureSchema). Storage is
//! a dense vector indexed by slot id, so `get`/`put` are O(1). The record is
//! created per input by the transformer, filled by downstream stages through
//! `put`/`merge`, and discarded once the combiner has consumed it.

use crate::schema::NamespaceId;

/// A mapping from namespace to value, built over a fixed slot universe.
///
/// # Examples
///
/// ```
/// use featurize_core::record::NamespacedRecord;
/// use featurize_core::schema::{FeatureSchema, ValueType};
///
/// let schema = FeatureSchema::new(vec![
///     ("a".to_string(), ValueType::Categorical),
///     ("b".to_string(), ValueType::Categorical),
/// ]).unwrap();
///
/// let mut record: NamespacedRecord<i32> = NamespacedRecord::new(schema.len());
/// let a = schema.resolve("a").unwrap();
/// record.put(a, 5);
/// assert_eq!(record.get(a), Some(&5));
/// assert_eq!(record.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NamespacedRecord<V> {
    slots: Vec<Option<V>>,
}

impl<V> NamespacedRecord<V> {
    /// Creates an empty record over a universe of `universe_size` slots.
    pub fn new(universe_size: usize) -> Self {
        let mut slots = Vec::with_capacity(universe_size);
        slots.resize_with(universe_size, || None);
        Self { slots }
    }

    /// Returns the value attached to `id`, if any.
    #[inline]
    pub fn get(&self, id: NamespaceId) -> Option<&V> {
        self.slots.get(id.index()).and_then(|slot| slot.as_ref())
    }

    /// Attaches a value to `id`, replacing any existing value.
    ///
    /// `id` must belong to the schema this record was sized for.
    #[inline]
    pub fn put(&mut self, id: NamespaceId, value: V) {
        debug_assert!(
            id.index() < self.slots.len(),
            "namespace id {} outside universe of size {}",
            id.index(),
            self.slots.len()
        );
        if id.index() < self.slots.len() {
            self.slots[id.index()] = Some(value);
        }
    }

    /// Merges another record into this one.
    ///
    /// Union semantics with first-writer-wins: slots already filled in `self`
    /// keep their value; only empty slots take values from `other`.
    pub fn merge(&mut self, other: NamespacedRecord<V>) {
        for (slot, incoming) in self.slots.iter_mut().zip(other.slots) {
            if slot.is_none() {
                *slot = incoming;
            }
        }
    }

    /// Returns the number of filled slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns whether no slot is filled.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// Returns the size of the slot universe.
    #[inline]
    pub fn universe_size(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over filled `(id, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NamespaceId, &V)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (NamespaceId(i), v)))
    }
}
