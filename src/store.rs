//! The merged configuration store.

use crate::error::Result;
use crate::merge::{MergeMode, merge_mappings};
use crate::value::{Mapping, Value};
use serde::{Deserialize, Serialize};

/// Root mapping produced by refresh, plus anything set or merged in directly.
///
/// `get` returns `None` for a missing key, so a stored `Null` stays
/// distinguishable from absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigStore {
    root: Mapping,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(root: Mapping) -> Self {
        Self { root }
    }

    /// Top-level lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Nested lookup, one key per level. Sequences take decimal indices.
    pub fn get_path<I, S>(&self, path: I) -> Option<&Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments = path.into_iter();
        let first = segments.next()?;
        self.root.get(first.as_ref())?.get_path(segments)
    }

    /// Nested lookup with a dotted path, e.g. `"db.user"` or `"hosts.0"`.
    pub fn lookup(&self, dotted: &str) -> Option<&Value> {
        self.get_path(dotted.split('.'))
    }

    pub fn has(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Bind `key` to `value`, replacing any existing binding.
    ///
    /// This is plain assignment; it does not go through the merge engine.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.root.insert(key.into(), value.into());
    }

    /// Remove a top-level binding, returning it. Absent keys are a no-op.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.root.shift_remove(key)
    }

    /// Fold a mapping in as if it were one more parsed file.
    pub fn merge(&mut self, mapping: Mapping) {
        self.merge_with(mapping, MergeMode::Append);
    }

    pub fn merge_with(&mut self, mapping: Mapping, mode: MergeMode) {
        merge_mappings(&mut self.root, mapping, mode);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.root.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.root
    }

    pub fn into_mapping(self) -> Mapping {
        self.root
    }

    pub fn clear(&mut self) {
        self.root.clear();
    }

    /// Swap in a freshly built root.
    pub(crate) fn replace(&mut self, root: Mapping) {
        self.root = root;
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuild a store from its JSON form.
    ///
    /// JSON does not record which sequences came from merge collisions, so
    /// every sequence comes back as a literal one.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<Mapping> for ConfigStore {
    fn from(root: Mapping) -> Self {
        Self::from_mapping(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConfigStore {
        ConfigStore::from_json(r#"{"db": {"user": "app", "hosts": ["a", "b"]}, "debug": null}"#)
            .unwrap()
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = store();
        assert!(store.get("nope").is_none());
        assert!(!store.has("nope"));
    }

    #[test]
    fn test_stored_null_is_present() {
        let store = store();
        assert_eq!(store.get("debug"), Some(&Value::Null));
        assert!(store.has("debug"));
    }

    #[test]
    fn test_nested_access() {
        let store = store();
        assert_eq!(
            store.get_path(["db", "user"]).and_then(Value::as_str),
            Some("app")
        );
        assert_eq!(store.lookup("db.hosts.1").and_then(Value::as_str), Some("b"));
        assert!(store.lookup("db.missing").is_none());
        assert!(store.get_path(Vec::<&str>::new()).is_none());
    }

    #[test]
    fn test_set_overwrites_without_coalescing() {
        let mut store = store();
        store.set("x", 5);
        assert_eq!(store.get("x"), Some(&Value::from(5)));
        store.set("x", 6);
        assert_eq!(store.get("x"), Some(&Value::from(6)));
    }

    #[test]
    fn test_delete() {
        let mut store = store();
        assert!(store.delete("db").is_some());
        assert!(store.delete("db").is_none());
        assert!(!store.has("db"));
    }

    #[test]
    fn test_merge_appends() {
        let mut store = store();
        let overlay = Value::from_iter([("user", "admin")]);
        store.merge(Mapping::from_iter([("db".to_string(), overlay)]));
        assert_eq!(
            store.lookup("db.user"),
            Some(&Value::coalesced([Value::from("app"), Value::from("admin")]))
        );
    }

    #[test]
    fn test_merge_with_overwrite() {
        let mut store = store();
        let overlay = Value::from_iter([("user", "admin")]);
        store.merge_with(
            Mapping::from_iter([("db".to_string(), overlay)]),
            MergeMode::Overwrite,
        );
        assert_eq!(store.lookup("db.user").and_then(Value::as_str), Some("admin"));
        assert!(store.lookup("db.hosts").is_some());
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let store = store();
        let text = store.to_json().unwrap();
        assert!(text.starts_with(r#"{"db":"#));
        assert_eq!(ConfigStore::from_json(&text).unwrap(), store);
    }
}
