use std::collections::BTreeSet;

use bids2isa_core::diagnostics::Diagnostics;
use bids2isa_core::governor::govern;
use bids2isa_core::keypath::{flatten, lookup};
use bids2isa_core::{ColumnPolicy, MetaMap, MetaValue, OntologyMap, SynonymTable, Table};
use proptest::prelude::*;

fn key() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9]{0,6}").unwrap()
}

fn leaf() -> impl Strategy<Value = MetaValue> {
    prop_oneof![
        Just(MetaValue::Null),
        any::<bool>().prop_map(MetaValue::Bool),
        any::<i64>().prop_map(MetaValue::Integer),
        (-1.0e6..1.0e6f64).prop_map(MetaValue::Float),
        prop_oneof![Just(String::new()), Just("UNDEFINED".to_string()), key()]
            .prop_map(MetaValue::Text),
        proptest::collection::vec(any::<i64>().prop_map(MetaValue::Integer), 0..3)
            .prop_map(MetaValue::List),
    ]
}

fn document() -> impl Strategy<Value = MetaMap> {
    let value = leaf().prop_recursive(3, 24, 4, |inner| {
        proptest::collection::btree_map(key(), inner, 0..4).prop_map(MetaValue::Map)
    });
    proptest::collection::btree_map(key(), value, 0..6)
}

fn count_leaves(doc: &MetaMap) -> usize {
    doc.values()
        .map(|v| match v {
            MetaValue::Map(nested) => count_leaves(nested),
            leaf if leaf.is_empty_leaf() => 0,
            _ => 1,
        })
        .sum()
}

const SYNONYM_KEYS: &[&str] = &["echotime", "RepetitionTime", "FlipAngle", "Manufacturer"];

const COLUMN_POOL: &[&str] = &[
    "Sample Name",
    "Protocol REF",
    "Parameter Value[repetition time]",
    "Parameter Value[flip angle]",
    "Parameter Value[TaskName]",
    "Parameter Value[PhaseEncodingDirection]",
    "Comment[resolution unit]",
    "Assay Name",
    "Raw Data File",
];

fn column_order() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(COLUMN_POOL.to_vec(), 1..=COLUMN_POOL.len())
        .prop_flat_map(|names| Just(names).prop_shuffle())
}

fn table_of(names: &[&str]) -> Table {
    let mut table = Table::new();
    for name in names {
        table.push_column(*name, vec![Some("v".to_string())]).unwrap();
    }
    table
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn flattened_paths_lead_to_non_empty_leaves(doc in document()) {
        let paths = flatten(&doc);
        for path in &paths {
            let value = lookup(path, &doc);
            prop_assert!(value.is_some(), "{} does not resolve", path);
            let value = value.unwrap();
            prop_assert!(value.as_map().is_none());
            prop_assert!(!value.is_empty_leaf());
        }
        prop_assert_eq!(paths.len(), count_leaves(&doc));
    }

    #[test]
    fn synonym_normalization_is_idempotent(raw in "[A-Za-z ]{0,24}") {
        let table = SynonymTable::default();
        let once = table.normalize(&raw);
        prop_assert_eq!(table.normalize(&once), once);
    }

    #[test]
    fn synonym_lookup_ignores_case(
        case in proptest::sample::select(SYNONYM_KEYS.to_vec())
            .prop_flat_map(|k| (Just(k), proptest::collection::vec(any::<bool>(), k.len())))
    ) {
        let (key, flips) = case;
        let table = SynonymTable::default();
        let mixed: String = key
            .chars()
            .zip(flips)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();
        prop_assert_eq!(table.normalize(&mixed), table.normalize(key));
        prop_assert_ne!(table.normalize(key), key);
    }

    #[test]
    fn drop_unlisted_ignores_column_order(names in column_order()) {
        let ontology = OntologyMap::default();
        let out = govern(
            table_of(&names),
            &ColumnPolicy::DropUnlisted,
            &ontology,
            &mut Diagnostics::new(),
        );
        let kept: Vec<&str> = out.column_names();
        let expected: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| ontology.contains(n))
            .collect();
        prop_assert_eq!(&kept, &expected);

        let mut sorted = names.clone();
        sorted.sort_unstable();
        let from_sorted = govern(
            table_of(&sorted),
            &ColumnPolicy::DropUnlisted,
            &ontology,
            &mut Diagnostics::new(),
        );
        let a: BTreeSet<&str> = kept.into_iter().collect();
        let b: BTreeSet<&str> = from_sorted.column_names().into_iter().collect();
        prop_assert_eq!(a, b);
    }
}
