//! Property-based tests for cache key derivation.
//!
//! Keys must be deterministic under re-serialization: logically equal
//! payloads always map to the same key regardless of object key order, and
//! the namespace survives as a readable prefix.

use brandex_core::cache::Cache;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ============================================================================
// Test Generators
// ============================================================================

fn namespace_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_map(|s| s.to_string())
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 /:._-]{0,40}".prop_map(Value::from),
    ]
}

/// A flat object with 1..8 distinct keys.
fn object_entries_strategy() -> impl Strategy<Value = Vec<(String, Value)>> {
    proptest::collection::hash_map("[a-z_]{1,12}", scalar_strategy(), 1..8)
        .prop_map(|map| map.into_iter().collect())
}

fn object_from(entries: &[(String, Value)]) -> Value {
    let mut map = Map::new();
    for (key, value) in entries {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}

// ============================================================================
// Determinism
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Deriving a key twice from the same payload gives the same key.
    #[test]
    fn prop_key_is_deterministic(ns in namespace_strategy(), entries in object_entries_strategy()) {
        let payload = object_from(&entries);
        prop_assert_eq!(Cache::make_key(&ns, &payload), Cache::make_key(&ns, &payload));
    }

    /// Object key insertion order never changes the derived key.
    #[test]
    fn prop_key_ignores_insertion_order(
        ns in namespace_strategy(),
        entries in object_entries_strategy(),
    ) {
        let forward = object_from(&entries);
        let mut reversed_entries = entries;
        reversed_entries.reverse();
        let reversed = object_from(&reversed_entries);

        prop_assert_eq!(Cache::make_key(&ns, &forward), Cache::make_key(&ns, &reversed));
    }

    /// Keys are `namespace:` plus a 64-character lowercase hex digest.
    #[test]
    fn prop_key_shape(ns in namespace_strategy(), entries in object_entries_strategy()) {
        let key = Cache::make_key(&ns, &object_from(&entries));

        let digest = key.strip_prefix(&format!("{ns}:")).expect("missing namespace prefix");
        prop_assert_eq!(digest.len(), 64);
        prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// Distinct target URLs map to distinct keys.
    #[test]
    fn prop_distinct_urls_get_distinct_keys(
        left in "[a-z0-9]{1,20}",
        right in "[a-z0-9]{1,20}",
    ) {
        prop_assume!(left != right);
        let a = Cache::make_key("extract", &json!({ "url": format!("https://{left}.test/") }));
        let b = Cache::make_key("extract", &json!({ "url": format!("https://{right}.test/") }));
        prop_assert_ne!(a, b);
    }

    /// Array order is significant, unlike object key order.
    #[test]
    fn prop_array_order_is_preserved(values in proptest::collection::vec(any::<i64>(), 2..6)) {
        let forward = json!({ "values": values });
        let mut reversed_values = match &forward["values"] {
            Value::Array(items) => items.clone(),
            _ => unreachable!(),
        };
        reversed_values.reverse();
        let reversed = json!({ "values": reversed_values });

        if forward != reversed {
            prop_assert_ne!(
                Cache::make_key("t", &forward),
                Cache::make_key("t", &reversed)
            );
        }
    }
}
