//! Recursive merge of configuration mappings.
//!
//! Mappings that meet under the same key are merged recursively. Any other
//! collision is resolved by the [`MergeMode`]:
//! - `Append` (used by refresh and [`ConfigStore::merge`](crate::ConfigStore::merge)):
//!   the colliding values are collected into a coalesced sequence, first arrival
//!   first. Nothing is overwritten or deduplicated.
//! - `Overwrite`: the later value replaces the earlier one.

use crate::value::{Mapping, Sequence, Value};

/// How non-mapping collisions are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Collect colliding values into a sequence.
    #[default]
    Append,
    /// Later values replace earlier ones.
    Overwrite,
}

/// Merge `overlay` into `base` in place.
///
/// # Example
/// ```
/// use confagg::{merge::{merge_mappings, MergeMode}, Mapping, Value};
///
/// let mut base: Mapping = [("db".to_string(), Value::from_iter([("user", "app")]))]
///     .into_iter()
///     .collect();
/// let overlay: Mapping = [("db".to_string(), Value::from_iter([("user", "admin")]))]
///     .into_iter()
///     .collect();
/// merge_mappings(&mut base, overlay, MergeMode::Append);
/// // Result: { "db": { "user": ["app", "admin"] } }
/// assert_eq!(
///     base["db"].get("user"),
///     Some(&Value::coalesced([Value::from("app"), Value::from("admin")]))
/// );
/// ```
pub fn merge_mappings(base: &mut Mapping, overlay: Mapping, mode: MergeMode) {
    for (key, overlay_value) in overlay {
        match base.get_mut(&key) {
            Some(base_value) => merge_values(base_value, overlay_value, mode),
            None => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Merge one value into another that already holds the same key.
pub fn merge_values(base: &mut Value, overlay: Value, mode: MergeMode) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            merge_mappings(base_map, overlay_map, mode)
        }
        (base, overlay) => match mode {
            MergeMode::Append => coalesce(base, overlay),
            MergeMode::Overwrite => *base = overlay,
        },
    }
}

/// Merge multiple mappings in order, starting from an empty mapping.
///
/// Equivalent to folding [`merge_mappings`] over the list.
pub fn merge_all(mappings: impl IntoIterator<Item = Mapping>, mode: MergeMode) -> Mapping {
    mappings.into_iter().fold(Mapping::new(), |mut acc, next| {
        merge_mappings(&mut acc, next, mode);
        acc
    })
}

/// Append `incoming` to a coalesced sequence, or start one from `existing`.
pub(crate) fn coalesce(existing: &mut Value, incoming: Value) {
    if let Value::Sequence(seq) = existing
        && seq.is_coalesced()
    {
        seq.push(incoming);
        return;
    }
    let previous = std::mem::take(existing);
    *existing = Value::Sequence(Sequence::coalesced(vec![previous, incoming]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> Mapping {
        serde_json::from_value::<Value>(value)
            .unwrap()
            .into_mapping()
            .unwrap()
    }

    fn seq(items: impl IntoIterator<Item = Value>) -> Value {
        Value::coalesced(items)
    }

    #[test]
    fn test_disjoint_keys_union() {
        let mut base = map(json!({"a": 1, "b": 2}));
        merge_mappings(&mut base, map(json!({"c": 3})), MergeMode::Append);
        assert_eq!(base, map(json!({"a": 1, "b": 2, "c": 3})));
    }

    #[test]
    fn test_scalar_collision_becomes_sequence() {
        let mut base = map(json!({"k": "x"}));
        merge_mappings(&mut base, map(json!({"k": "y"})), MergeMode::Append);
        assert_eq!(base["k"], seq([Value::from("x"), Value::from("y")]));
    }

    #[test]
    fn test_third_value_appends() {
        let mut base = map(json!({"k": 1}));
        merge_mappings(&mut base, map(json!({"k": 2})), MergeMode::Append);
        merge_mappings(&mut base, map(json!({"k": 3})), MergeMode::Append);
        assert_eq!(
            base["k"],
            seq([Value::from(1), Value::from(2), Value::from(3)])
        );
    }

    #[test]
    fn test_equal_values_are_not_deduplicated() {
        let merged = merge_all(
            [map(json!({"k": "same"})), map(json!({"k": "same"}))],
            MergeMode::Append,
        );
        assert_eq!(merged["k"], seq([Value::from("same"), Value::from("same")]));
    }

    #[test]
    fn test_nested_collision_coalesces_at_leaf() {
        let merged = merge_all(
            [
                map(json!({"cat": {"key": "v1"}})),
                map(json!({"cat": {"key": "v2"}})),
            ],
            MergeMode::Append,
        );
        assert_eq!(
            merged["cat"].get("key"),
            Some(&seq([Value::from("v1"), Value::from("v2")]))
        );
    }

    #[test]
    fn test_mappings_recurse_without_wrapping() {
        let merged = merge_all(
            [map(json!({"cat": {"a": 1}})), map(json!({"cat": {"b": 2}}))],
            MergeMode::Append,
        );
        assert_eq!(merged, map(json!({"cat": {"a": 1, "b": 2}})));
    }

    #[test]
    fn test_mapping_scalar_mismatch_coalesces() {
        let merged = merge_all(
            [map(json!({"v": {"nested": true}})), map(json!({"v": 42}))],
            MergeMode::Append,
        );
        let expected = seq([Value::from_iter([("nested", true)]), Value::from(42)]);
        assert_eq!(merged["v"], expected);
    }

    #[test]
    fn test_literal_sequence_is_wrapped_not_extended() {
        let merged = merge_all(
            [map(json!({"items": [1, 2]})), map(json!({"items": 3}))],
            MergeMode::Append,
        );
        let items = merged["items"].as_sequence().unwrap();
        assert!(items.is_coalesced());
        assert_eq!(items.len(), 2);
        assert_eq!(items.items()[0], Value::sequence([Value::from(1), Value::from(2)]));
        assert_eq!(items.items()[1], Value::from(3));
    }

    #[test]
    fn test_null_collides_like_any_scalar() {
        let merged = merge_all(
            [map(json!({"k": null})), map(json!({"k": 1}))],
            MergeMode::Append,
        );
        assert_eq!(merged["k"], seq([Value::Null, Value::from(1)]));
    }

    #[test]
    fn test_overwrite_mode_later_wins() {
        let merged = merge_all(
            [
                map(json!({"server": {"host": "localhost", "port": 8080}, "debug": true})),
                map(json!({"server": {"port": 9000}, "debug": false})),
            ],
            MergeMode::Overwrite,
        );
        assert_eq!(
            merged,
            map(json!({"server": {"host": "localhost", "port": 9000}, "debug": false}))
        );
    }

    #[test]
    fn test_overwrite_mode_replaces_mapping_with_scalar() {
        let merged = merge_all(
            [map(json!({"v": {"nested": true}})), map(json!({"v": 42}))],
            MergeMode::Overwrite,
        );
        assert_eq!(merged, map(json!({"v": 42})));
    }

    #[test]
    fn test_deep_nested_merge() {
        let merged = merge_all(
            [
                map(json!({"l1": {"l2": {"l3": {"a": 1, "b": 2}}}})),
                map(json!({"l1": {"l2": {"l3": {"b": 3, "c": 4}}}})),
            ],
            MergeMode::Append,
        );
        let l3 = merged["l1"]
            .get_path(["l2", "l3"])
            .and_then(Value::as_mapping)
            .unwrap();
        assert_eq!(l3["a"], Value::from(1));
        assert_eq!(l3["b"], seq([Value::from(2), Value::from(3)]));
        assert_eq!(l3["c"], Value::from(4));
    }
}
