//! Merge functionality for settings trees.
//!
//! Files are merged with a shallow, top-level overwrite: a key from a later
//! file replaces the whole value of the same key from an earlier file.
//! Environment overrides are written one leaf at a time with [`insert_at`],
//! which descends into nested mappings and creates them as needed.

use super::keypath::KeyPath;
use serde_json::{Map, Value};

/// The merged settings tree.
pub type Mapping = Map<String, Value>;

/// Merge `overlay` into `root`, overlay keys replacing root keys wholesale.
///
/// # Example
/// ```
/// use serde_json::json;
/// use app_settings::config::merge_top_level;
///
/// let mut root = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "debug": true
/// });
/// let overlay = json!({ "server": { "port": 9000 } });
/// merge_top_level(root.as_object_mut().unwrap(), overlay.as_object().unwrap().clone());
/// // Result: { "server": { "port": 9000 }, "debug": true }
/// assert_eq!(root, json!({ "server": { "port": 9000 }, "debug": true }));
/// ```
pub fn merge_top_level(root: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        root.insert(key, value);
    }
}

/// Write `value` at `path`, creating intermediate mappings.
///
/// A non-mapping value sitting on an intermediate segment is replaced by an
/// empty mapping. Whatever sits at the leaf is replaced. An empty path is a
/// no-op and returns `false`.
pub fn insert_at(root: &mut Mapping, path: &KeyPath, value: Value) -> bool {
    let Some((leaf, parents)) = path.split_last() else {
        return false;
    };

    let mut current = root;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Mapping::new()));
        if !slot.is_object() {
            *slot = Value::Object(Mapping::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => unreachable!("slot was just made a mapping"),
        };
    }

    current.insert(leaf.to_string(), value);
    true
}

/// Name of the value's kind, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> Mapping {
        match value {
            Value::Object(map) => map,
            other => panic!("expected mapping, got {other}"),
        }
    }

    #[test]
    fn test_merge_simple_objects() {
        let mut root = mapping(json!({"a": 1, "b": 2}));
        merge_top_level(&mut root, mapping(json!({"b": 3, "c": 4})));
        assert_eq!(Value::Object(root), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_nested_mapping_replaced_wholesale() {
        let mut root = mapping(json!({
            "redefine": {"val": "settings.yml", "list": [1, 2]},
            "debug": true
        }));
        merge_top_level(&mut root, mapping(json!({"redefine": {"val": "development.yml"}})));
        assert_eq!(
            Value::Object(root),
            json!({
                "redefine": {"val": "development.yml"},
                "debug": true
            })
        );
    }

    #[test]
    fn test_arrays_replaced_not_merged() {
        let mut root = mapping(json!({"items": [1, 2, 3]}));
        merge_top_level(&mut root, mapping(json!({"items": [4, 5]})));
        assert_eq!(Value::Object(root), json!({"items": [4, 5]}));
    }

    #[test]
    fn test_null_overlay_replaces() {
        let mut root = mapping(json!({"a": 1}));
        merge_top_level(&mut root, mapping(json!({"a": null})));
        assert_eq!(Value::Object(root), json!({"a": null}));
    }

    #[test]
    fn test_insert_creates_intermediate_mappings() {
        let mut root = Mapping::new();
        let path = KeyPath::new(["custom", "new", "var"]);
        assert!(insert_at(&mut root, &path, json!("environment value")));
        assert_eq!(
            Value::Object(root),
            json!({"custom": {"new": {"var": "environment value"}}})
        );
    }

    #[test]
    fn test_insert_keeps_siblings() {
        let mut root = mapping(json!({
            "level1": {"level2": {"a": 1, "b": 2}}
        }));
        let path = KeyPath::new(["level1", "level2", "b"]);
        insert_at(&mut root, &path, json!("3"));
        assert_eq!(
            Value::Object(root),
            json!({"level1": {"level2": {"a": 1, "b": "3"}}})
        );
    }

    #[test]
    fn test_insert_replaces_leaf_of_any_kind() {
        let mut root = mapping(json!({"redefine": {"list": [1, 2], "flag": true}}));
        insert_at(&mut root, &KeyPath::new(["redefine", "list"]), json!("x"));
        insert_at(&mut root, &KeyPath::new(["redefine", "flag"]), json!("false"));
        assert_eq!(
            Value::Object(root),
            json!({"redefine": {"list": "x", "flag": "false"}})
        );
    }

    #[test]
    fn test_insert_through_scalar_intermediate() {
        let mut root = mapping(json!({"value": 42}));
        insert_at(&mut root, &KeyPath::new(["value", "nested"]), json!("yes"));
        assert_eq!(Value::Object(root), json!({"value": {"nested": "yes"}}));
    }

    #[test]
    fn test_insert_empty_path_is_noop() {
        let mut root = mapping(json!({"a": 1}));
        assert!(!insert_at(&mut root, &KeyPath::default(), json!("x")));
        assert_eq!(Value::Object(root), json!({"a": 1}));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(kind_of(&json!([1])), "a sequence");
        assert_eq!(kind_of(&json!({})), "a mapping");
        assert_eq!(kind_of(&json!("s")), "a string");
    }
}
