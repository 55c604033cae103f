//! Recursive string extraction from JSON UI descriptions.
//!
//! The `ui_describe_all` tool returns an arbitrary JSON accessibility tree:
//! keyed mappings, ordered sequences, and scalar leaves. The probe flattens
//! that tree into the ordered sequence of every string leaf so the result can
//! be pattern-matched without knowing the tree's shape.
//!
//! Traversal is depth-first in document order: object entries in the order
//! they appear in the source text (`serde_json`'s `preserve_order` feature),
//! array elements in index order. Duplicates are kept; numbers, booleans, and
//! nulls are skipped.

use serde_json::Value;

/// Collect every string leaf of `value` into a flat ordered sequence.
pub fn extract_strings(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect(value, &mut out);
    out
}

fn collect(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                collect(item, out);
            }
        }
        Value::Object(map) => {
            for (_key, child) in map {
                collect(child, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_string_is_extracted() {
        assert_eq!(extract_strings(&json!("hello")), vec!["hello"]);
    }

    #[test]
    fn non_string_scalars_yield_nothing() {
        assert!(extract_strings(&json!(42)).is_empty());
        assert!(extract_strings(&json!(true)).is_empty());
        assert!(extract_strings(&json!(null)).is_empty());
        assert!(extract_strings(&json!(3.25)).is_empty());
    }

    #[test]
    fn tree_without_string_leaves_yields_empty_sequence() {
        let value = json!({ "a": [1, 2, { "b": false }], "c": { "d": null } });
        assert!(extract_strings(&value).is_empty());
    }

    #[test]
    fn document_order_example() {
        // The canonical probe example: label inside a mapping, then a string
        // inside a mixed array.
        let value: Value =
            serde_json::from_str(r#"{"a": {"label": "John 3:16"}, "b": [1, true, "Exodus 20:3"]}"#)
                .unwrap();
        assert_eq!(extract_strings(&value), vec!["John 3:16", "Exodus 20:3"]);
    }

    #[test]
    fn object_keys_iterate_in_document_order_not_sorted() {
        let value: Value = serde_json::from_str(r#"{"z": "first", "a": "second"}"#).unwrap();
        assert_eq!(extract_strings(&value), vec!["first", "second"]);
    }

    #[test]
    fn array_elements_visit_in_index_order() {
        let value = json!(["one", ["two", "three"], "four"]);
        assert_eq!(extract_strings(&value), vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let value = json!({ "a": "dup", "b": { "c": "dup" }, "d": ["dup"] });
        assert_eq!(extract_strings(&value), vec!["dup", "dup", "dup"]);
    }

    #[test]
    fn length_matches_string_leaf_count() {
        let value = json!({
            "AXLabel": "Settings",
            "children": [
                { "AXValue": "General", "frame": { "x": 0, "y": 44 } },
                { "AXValue": "Privacy", "enabled": true },
                "loose text"
            ],
            "version": 17
        });
        let strings = extract_strings(&value);
        assert_eq!(strings.len(), 4);
        assert_eq!(strings, vec!["Settings", "General", "Privacy", "loose text"]);
    }

    #[test]
    fn empty_containers_yield_nothing() {
        assert!(extract_strings(&json!({})).is_empty());
        assert!(extract_strings(&json!([])).is_empty());
    }
}
