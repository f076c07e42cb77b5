//! Property-Based Tests for the Cache Module
//!
//! Uses proptest to verify the fingerprinting and namespace correctness
//! properties the rest of the gateway relies on.

use std::time::Duration;

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::cache::{fingerprint, CacheNamespace};

// == Strategies ==
/// Generates parameter names the way report requests produce them.
fn param_name_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,16}"
}

/// Generates scalar parameter values (strings, ints, bools, null).
fn param_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 :-]{0,24}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Generates a parameter set as a list of distinct (name, value) pairs.
fn param_set_strategy() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::btree_map(param_name_strategy(), param_value_strategy(), 1..8)
        .prop_map(|m| m.into_iter().collect())
}

fn to_object(pairs: &[(String, Value)]) -> Value {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert(k.clone(), v.clone());
    }
    Value::Object(map)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any parameter set, the fingerprint does not depend on the order
    // the parameters were assembled in.
    #[test]
    fn prop_fingerprint_order_independence(
        pairs in param_set_strategy(),
        seed in any::<u64>(),
    ) {
        let forward = to_object(&pairs);

        // Deterministic pseudo-shuffle driven by the seed
        let mut shuffled = pairs.clone();
        let len = shuffled.len();
        for i in 0..len {
            let j = (seed as usize).wrapping_mul(31).wrapping_add(i * 7) % len;
            shuffled.swap(i, j);
        }
        let reordered = to_object(&shuffled);

        prop_assert_eq!(fingerprint(&forward).unwrap(), fingerprint(&reordered).unwrap());
    }

    // For any parameter set, the fingerprint is stable across invocations.
    #[test]
    fn prop_fingerprint_deterministic(pairs in param_set_strategy()) {
        let params = to_object(&pairs);
        prop_assert_eq!(fingerprint(&params).unwrap(), fingerprint(&params).unwrap());
    }

    // For any parameter set P and value V, set(P, V) followed immediately
    // by get(P) returns V.
    #[test]
    fn prop_round_trip(pairs in param_set_strategy(), payload in any::<i64>()) {
        let mut ns = CacheNamespace::new("prop", Duration::from_secs(3600));
        let params = to_object(&pairs);

        ns.set(&params, Value::from(payload)).unwrap();
        prop_assert_eq!(ns.get(&params).unwrap(), Some(Value::from(payload)));
    }

    // Overwriting the same parameter set never grows the namespace and the
    // last write wins.
    #[test]
    fn prop_overwrite_last_write_wins(
        pairs in param_set_strategy(),
        payloads in prop::collection::vec(any::<i64>(), 1..10),
    ) {
        let mut ns = CacheNamespace::new("prop", Duration::from_secs(3600));
        let params = to_object(&pairs);

        for p in &payloads {
            ns.set(&params, Value::from(*p)).unwrap();
        }

        prop_assert_eq!(ns.len(), 1);
        let last = *payloads.last().unwrap();
        prop_assert_eq!(ns.get(&params).unwrap(), Some(Value::from(last)));
    }

    // flush() always leaves the namespace empty and reports every removal.
    #[test]
    fn prop_flush_empties_namespace(
        sets in prop::collection::vec(param_set_strategy(), 1..10),
    ) {
        let mut ns = CacheNamespace::new("prop", Duration::from_secs(3600));
        for (i, pairs) in sets.iter().enumerate() {
            ns.set(&to_object(pairs), Value::from(i as i64)).unwrap();
        }

        let before = ns.len();
        let stats = ns.flush();
        prop_assert_eq!(stats.removed, before);
        prop_assert!(ns.is_empty());
    }
}
