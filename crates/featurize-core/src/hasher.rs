//! The hashing stage: raw records to hashed records.
//!
//! Strings are hashed to 32-bit indices; integer ids pass through unchanged;
//! numeric weights are carried through paired with their (hashed, for
//! string-keyed variants) indices. Each [`RawValue`] memoizes its hashed form
//! so a value shared across several interaction crosses is hashed once.

use crate::audit::AuditState;
use crate::hash;
use crate::hashed_value::HashedValue;
use crate::raw_value::{RawValue, RawValueKind};
use crate::record::NamespacedRecord;

/// Computes the hashed form of a raw value. Integers are never hashed.
fn hash_raw(raw: &RawValue) -> HashedValue {
    match raw.kind() {
        RawValueKind::SingleString => {
            // Accessors cannot fail once the kind has been matched.
            let s = raw.as_single_string().unwrap_or_default();
            HashedValue::single_categorical(hash::hash_string(s))
        }
        RawValueKind::Strings => {
            let indices = raw
                .as_strings()
                .unwrap_or_default()
                .iter()
                .map(|s| hash::hash_string(s))
                .collect();
            HashedValue::categoricals(indices)
        }
        RawValueKind::StringsToNumericals => {
            let indices: Vec<i32> = raw
                .as_strings()
                .unwrap_or_default()
                .iter()
                .map(|s| hash::hash_string(s))
                .collect();
            let values = raw.as_numericals().unwrap_or_default().to_vec();
            HashedValue::Numerical { indices, values }
        }
        RawValueKind::SingleNumerical => {
            HashedValue::single_numerical(raw.as_single_numerical().unwrap_or_default())
        }
        RawValueKind::SingleCategorical => {
            HashedValue::single_categorical(raw.as_single_categorical().unwrap_or_default())
        }
        RawValueKind::Categoricals => {
            HashedValue::categoricals(raw.as_categoricals().unwrap_or_default().to_vec())
        }
        RawValueKind::CategoricalsToNumericals => HashedValue::Numerical {
            indices: raw.as_categoricals().unwrap_or_default().to_vec(),
            values: raw.as_numericals().unwrap_or_default().to_vec(),
        },
    }
}

/// Converts a record of raw values into a record of hashed values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher;

impl Hasher {
    /// Creates a hasher.
    pub fn new() -> Self {
        Hasher
    }

    /// Hashes every present namespace of the input record.
    ///
    /// Absent namespaces stay absent. Repeated calls over the same raw-value
    /// objects reuse the memoized hashed form.
    pub fn apply(&self, input: &NamespacedRecord<RawValue>) -> NamespacedRecord<HashedValue> {
        let mut out = NamespacedRecord::new(input.universe_size());
        for (id, raw) in input.iter() {
            let hashed = raw.hashed_or_compute(|| hash_raw(raw));
            out.put(id, hashed.clone());
        }
        out
    }

    /// Like [`apply`](Self::apply), additionally recording the provenance of
    /// every hashed index into `audit`.
    ///
    /// Recording never changes the hashed output.
    pub fn apply_audited(
        &self,
        input: &NamespacedRecord<RawValue>,
        audit: &mut AuditState,
    ) -> NamespacedRecord<HashedValue> {
        let mut out = NamespacedRecord::new(input.universe_size());
        for (id, raw) in input.iter() {
            let hashed = raw.hashed_or_compute(|| hash_raw(raw));
            audit.register(id, raw, hashed);
            out.put(id, hashed.clone());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::HashedFeatureName;
    use crate::schema::NamespaceId;

    fn record(values: Vec<(usize, RawValue)>, universe: usize) -> NamespacedRecord<RawValue> {
        let mut r = NamespacedRecord::new(universe);
        for (slot, v) in values {
            r.put(NamespaceId(slot), v);
        }
        r
    }

    #[test]
    fn test_integers_pass_through_unhashed() {
        let input = record(vec![(0, RawValue::single_categorical(42))], 1);
        let hashed = Hasher::new().apply(&input);
        assert_eq!(
            hashed.get(NamespaceId(0)),
            Some(&HashedValue::single_categorical(42))
        );
    }

    #[test]
    fn test_categoricals_to_numericals_pass_through() {
        let raw = RawValue::categoricals_to_numericals(vec![3, 4], vec![0.5, 2.0]).unwrap();
        let input = record(vec![(0, raw)], 1);
        let hashed = Hasher::new().apply(&input);
        assert_eq!(
            hashed.get(NamespaceId(0)),
            Some(&HashedValue::numericals(vec![3, 4], vec![0.5, 2.0]).unwrap())
        );
    }

    #[test]
    fn test_strings_are_hashed() {
        let input = record(vec![(0, RawValue::single_string("chrome"))], 1);
        let hashed = Hasher::new().apply(&input);
        assert_eq!(
            hashed.get(NamespaceId(0)),
            Some(&HashedValue::single_categorical(hash::hash_string("chrome")))
        );
    }

    #[test]
    fn test_strings_to_numericals_keep_weights() {
        let raw =
            RawValue::strings_to_numericals(vec!["x".to_string(), "y".to_string()], vec![1.5, 2.5])
                .unwrap();
        let input = record(vec![(0, raw)], 1);
        let hashed = Hasher::new().apply(&input);
        let value = hashed.get(NamespaceId(0)).unwrap();
        assert_eq!(
            value.numerical_indices().unwrap(),
            &[hash::hash_string("x"), hash::hash_string("y")]
        );
        assert_eq!(value.numerical_values().unwrap(), &[1.5, 2.5]);
    }

    #[test]
    fn test_absent_namespaces_stay_absent() {
        let input = record(vec![(1, RawValue::single_numerical(1.0))], 3);
        let hashed = Hasher::new().apply(&input);
        assert_eq!(hashed.get(NamespaceId(0)), None);
        assert_eq!(hashed.get(NamespaceId(2)), None);
        assert_eq!(hashed.len(), 1);
    }

    #[test]
    fn test_memo_reused_across_calls() {
        let raw = RawValue::single_string("once");
        let input = record(vec![(0, raw)], 1);

        let first = Hasher::new().apply(&input);
        let cached = input
            .get(NamespaceId(0))
            .and_then(|r| r.cached_hashed())
            .cloned();
        let second = Hasher::new().apply(&input);

        assert_eq!(first, second);
        assert_eq!(cached.as_ref(), first.get(NamespaceId(0)));
    }

    #[test]
    fn test_audit_records_provenance_without_changing_output() {
        let input = record(
            vec![(0, RawValue::strings(vec!["a".to_string(), "b".to_string()]))],
            1,
        );

        let plain = Hasher::new().apply(&input);
        let mut audit = AuditState::new();
        let audited = Hasher::new().apply_audited(&input, &mut audit);
        assert_eq!(plain, audited);

        let name = audit
            .lookup(&HashedFeatureName {
                namespace: NamespaceId(0),
                hashed_index: hash::hash_string("b"),
            })
            .unwrap();
        assert_eq!(name.source_value, "b");
    }
}
