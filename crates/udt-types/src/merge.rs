//! Deep merge for JSON property values.
//!
//! Objects merge key by key, recursing into nested objects. Every other
//! patch value (arrays, strings, numbers, booleans, null) replaces whatever
//! the base held at that position.

use serde_json::Value;

/// Returns `true` for values that are not scalars (objects and arrays).
pub fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Merge `patch` into `base`, returning the combined value.
///
/// Keys present only in `base` are kept. Keys present in both are merged
/// recursively when both sides are objects, otherwise the patch wins.
/// A non-object `base` is replaced by the patch.
pub fn deep_merge(base: Option<&Value>, patch: &Value) -> Value {
    match (base, patch) {
        (Some(Value::Object(base)), Value::Object(patch)) => {
            let mut merged = base.clone();
            for (key, incoming) in patch {
                let next = deep_merge(merged.get(key), incoming);
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_disjoint_keys() {
        let base = json!({"foo": 1});
        let merged = deep_merge(Some(&base), &json!({"bar": 2}));
        assert_eq!(merged, json!({"foo": 1, "bar": 2}));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let base = json!({"labels": {"cat": {"color": "red"}, "dog": {}}, "type": "image"});
        let patch = json!({"labels": {"cat": {"hotkey": "c"}}});
        let merged = deep_merge(Some(&base), &patch);
        assert_eq!(
            merged,
            json!({
                "labels": {"cat": {"color": "red", "hotkey": "c"}, "dog": {}},
                "type": "image"
            })
        );
    }

    #[test]
    fn scalars_in_patch_overwrite() {
        let base = json!({"type": "image", "nested": {"a": 1}});
        let merged = deep_merge(Some(&base), &json!({"type": "video", "nested": 5}));
        assert_eq!(merged, json!({"type": "video", "nested": 5}));
    }

    #[test]
    fn arrays_replace_instead_of_concatenating() {
        let base = json!({"labels": ["a", "b"]});
        let merged = deep_merge(Some(&base), &json!({"labels": ["c"]}));
        assert_eq!(merged, json!({"labels": ["c"]}));
    }

    #[test]
    fn missing_or_scalar_base_takes_patch() {
        assert_eq!(deep_merge(None, &json!({"a": 1})), json!({"a": 1}));
        assert_eq!(deep_merge(Some(&json!(3)), &json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn null_in_patch_is_kept_as_value() {
        let base = json!({"a": 1, "b": 2});
        let merged = deep_merge(Some(&base), &json!({"b": null}));
        assert_eq!(merged, json!({"a": 1, "b": null}));
    }

    proptest::proptest! {
        #[test]
        fn flat_merge_keeps_base_keys_and_applies_patch(
            base in proptest::collection::btree_map("[a-e]", 0i64..100, 0..5),
            patch in proptest::collection::btree_map("[c-h]", 0i64..100, 0..5),
        ) {
            let base_value = serde_json::to_value(&base).unwrap();
            let patch_value = serde_json::to_value(&patch).unwrap();
            let merged = deep_merge(Some(&base_value), &patch_value);
            for (key, value) in &patch {
                proptest::prop_assert_eq!(&merged[key], &json!(value));
            }
            for (key, value) in base.iter().filter(|(k, _)| !patch.contains_key(*k)) {
                proptest::prop_assert_eq!(&merged[key], &json!(value));
            }
        }
    }

    #[test]
    fn structured_detection() {
        assert!(is_structured(&json!({})));
        assert!(is_structured(&json!([])));
        assert!(!is_structured(&json!("x")));
        assert!(!is_structured(&json!(null)));
        assert!(!is_structured(&json!(1.5)));
    }
}
