//! Right-biased recursive merge for config documents.

use crate::value::{ConfigMapping, ConfigValue};

/// Merge `overrides` onto `base`.
///
/// Mappings merge key by key (recursively); any other override value,
/// including a mapping over a non-mapping, replaces the base value.
#[must_use]
pub fn merge_documents(base: &ConfigValue, overrides: &ConfigValue) -> ConfigValue {
    match (base, overrides) {
        (ConfigValue::Mapping(base), ConfigValue::Mapping(overrides)) => {
            ConfigValue::Mapping(merge_mappings(base, overrides))
        },
        (_, overrides) => overrides.clone(),
    }
}

/// Merge two mappings, with keys from `overrides` winning.
#[must_use]
pub fn merge_mappings(base: &ConfigMapping, overrides: &ConfigMapping) -> ConfigMapping {
    let mut merged = base.clone();
    for (key, value) in overrides {
        let next = match merged.get(key) {
            Some(existing) => merge_documents(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nested_mappings_merge_key_by_key() {
        let base = ConfigValue::mapping([
            (
                "run_storage",
                ConfigValue::mapping([
                    ("module", ConfigValue::from("a")),
                    ("class", ConfigValue::from("A")),
                ]),
            ),
            ("keep", ConfigValue::Int(1)),
        ]);
        let overrides = ConfigValue::mapping([(
            "run_storage",
            ConfigValue::mapping([("class", ConfigValue::from("B"))]),
        )]);

        let merged = merge_documents(&base, &overrides);
        assert_eq!(
            merged.pointer("run_storage.module").and_then(ConfigValue::as_str),
            Some("a")
        );
        assert_eq!(
            merged.pointer("run_storage.class").and_then(ConfigValue::as_str),
            Some("B")
        );
        assert_eq!(merged.get("keep"), Some(&ConfigValue::Int(1)));
    }

    #[test]
    fn scalars_and_sequences_are_replaced_wholesale() {
        let base = ConfigValue::mapping([(
            "tags",
            ConfigValue::Sequence(vec![ConfigValue::from("a"), ConfigValue::from("b")]),
        )]);
        let overrides = ConfigValue::mapping([(
            "tags",
            ConfigValue::Sequence(vec![ConfigValue::from("c")]),
        )]);
        assert_eq!(merge_documents(&base, &overrides), overrides);
    }

    fn arb_document() -> impl Strategy<Value = ConfigValue> {
        let leaf = prop_oneof![
            Just(ConfigValue::Null),
            any::<i64>().prop_map(ConfigValue::Int),
            "[a-z]{0,4}".prop_map(ConfigValue::String),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop::collection::btree_map("[a-c]", inner, 0..4).prop_map(ConfigValue::Mapping)
        })
    }

    proptest! {
        #[test]
        fn merge_is_idempotent_in_overrides(a in arb_document(), b in arb_document()) {
            let once = merge_documents(&a, &b);
            prop_assert_eq!(merge_documents(&once, &b), once);
        }

        #[test]
        fn empty_overrides_keep_base_mappings(a in arb_document()) {
            let merged = merge_documents(&a, &ConfigValue::empty_mapping());
            if a.as_mapping().is_some() {
                prop_assert_eq!(merged, a);
            } else {
                prop_assert_eq!(merged, ConfigValue::empty_mapping());
            }
        }
    }
}
