//! Property-based tests for the deep merge primitive.
//!
//! These tests use proptest to generate random JSON values and verify that
//! the merge contract holds for all inputs, not just the handcrafted cases
//! in the unit tests.

#[cfg(test)]
mod proptest_tests {
    use crate::merge::{merge, MergeKeys, MergePolicy};
    use proptest::prelude::*;
    use serde_json::Value;

    /// Strategy producing arbitrary JSON values of bounded depth and size.
    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            "[a-z0-9]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,5}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    /// Strategy producing arbitrary JSON objects.
    fn json_object() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-z]{1,5}", json_value(), 0..8)
            .prop_map(|m| Value::Object(m.into_iter().collect()))
    }

    proptest! {
        /// Property: merge never mutates its inputs.
        #[test]
        fn merge_leaves_inputs_untouched(a in json_value(), b in json_value()) {
            let a_before = a.clone();
            let b_before = b.clone();
            let _ = merge(&a, &b, MergePolicy::Merge, &MergeKeys::new());
            prop_assert_eq!(a, a_before);
            prop_assert_eq!(b, b_before);
        }

        /// Property: merge is deterministic (same inputs = same output).
        #[test]
        fn merge_is_deterministic(a in json_value(), b in json_value()) {
            let first = merge(&a, &b, MergePolicy::Merge, &MergeKeys::new());
            let second = merge(&a, &b, MergePolicy::Merge, &MergeKeys::new());
            prop_assert_eq!(first, second);
        }

        /// Property: for object pairs, every key of either side appears in
        /// the merged result.
        #[test]
        fn merge_result_contains_key_union(a in json_object(), b in json_object()) {
            let result = merge(&a, &b, MergePolicy::Merge, &MergeKeys::new());
            let result_map = result.as_object().expect("object merge yields object");
            for key in a.as_object().into_iter().flat_map(|m| m.keys()) {
                prop_assert!(result_map.contains_key(key), "missing key from first: {}", key);
            }
            for key in b.as_object().into_iter().flat_map(|m| m.keys()) {
                prop_assert!(result_map.contains_key(key), "missing key from second: {}", key);
            }
        }

        /// Property: under Overwrite, every key of the incoming object wins
        /// wholesale and keys only in the first survive.
        #[test]
        fn overwrite_takes_incoming_wholesale(a in json_object(), b in json_object()) {
            let result = merge(&a, &b, MergePolicy::Overwrite, &MergeKeys::new());
            let result_map = result.as_object().expect("object merge yields object");
            let b_map = b.as_object().expect("strategy yields objects");
            for (key, value) in b_map {
                prop_assert_eq!(result_map.get(key), Some(value));
            }
            for (key, value) in a.as_object().expect("strategy yields objects") {
                if !b_map.contains_key(key) {
                    prop_assert_eq!(result_map.get(key), Some(value));
                }
            }
        }

        /// Property: array fields without a merge-key concatenate, so the
        /// merged length is the sum of both sides.
        #[test]
        fn array_concat_preserves_lengths(
            xs in prop::collection::vec(json_value(), 0..8),
            ys in prop::collection::vec(json_value(), 0..8),
        ) {
            let a = serde_json::json!({ "items": xs });
            let b = serde_json::json!({ "items": ys });
            let result = merge(&a, &b, MergePolicy::Merge, &MergeKeys::new());
            let merged = result["items"].as_array().expect("arrays concatenate");
            prop_assert_eq!(
                merged.len(),
                a["items"].as_array().expect("array").len()
                    + b["items"].as_array().expect("array").len()
            );
        }

        /// Property: with a merge-key, no element of the result matches an
        /// incoming element unless it is that incoming element (no duplicate
        /// keys survive an upsert).
        #[test]
        fn upsert_leaves_no_matched_survivors(
            ids_a in prop::collection::vec(0i64..6, 0..6),
            ids_b in prop::collection::vec(0i64..6, 0..6),
        ) {
            let a = serde_json::json!({
                "rows": ids_a.iter().map(|id| serde_json::json!({"id": id, "from": "a"}))
                    .collect::<Vec<_>>()
            });
            let b = serde_json::json!({
                "rows": ids_b.iter().map(|id| serde_json::json!({"id": id, "from": "b"}))
                    .collect::<Vec<_>>()
            });
            let keys = MergeKeys::new().by_field("rows", "id");
            let result = merge(&a, &b, MergePolicy::Merge, &keys);
            let rows = result["rows"].as_array().expect("arrays upsert");

            // Every surviving "a" row must have an id absent from "b".
            for row in rows.iter().filter(|r| r["from"] == "a") {
                let id = row["id"].as_i64().expect("id is a number");
                prop_assert!(!ids_b.contains(&id), "matched survivor with id {}", id);
            }
            // All of "b" is present, in order, at the tail.
            let tail = rows.len() - ids_b.len();
            for (row, id) in rows[tail..].iter().zip(&ids_b) {
                prop_assert_eq!(row["id"].as_i64(), Some(*id));
                prop_assert_eq!(&row["from"], &serde_json::json!("b"));
            }
        }
    }
}
