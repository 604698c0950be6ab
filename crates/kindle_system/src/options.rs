//! Option trees and deep merging.
//!
//! An [`OptionTree`] is the nested, insertion-ordered mapping every part of a
//! bootstrap is configured from. Trees arrive already parsed (or as JSON via
//! [`OptionTree::from_json_str`]); the engine never looks at file formats.
//!
//! Keys keep the spelling they were inserted with, but every lookup is
//! case-insensitive and the canonical form used internally is lower-case
//! (see [`normalize_key`]).
//!
//! # Example
//!
//! ```
//! use kindle_system::options::{merge, OptionTree};
//!
//! let base = OptionTree::from_json_str(r#"{"db": {"host": "localhost"}}"#).unwrap();
//! let overlay = OptionTree::from_json_str(r#"{"db": {"port": 5432}}"#).unwrap();
//!
//! let merged = merge(&base, &overlay);
//! let db = merged.get("DB").and_then(|v| v.as_tree()).unwrap();
//! assert_eq!(db.get("host").and_then(|v| v.as_str()), Some("localhost"));
//! assert_eq!(db.get("port").and_then(|v| v.as_i64()), Some(5432));
//! ```

use crate::error::{BootstrapError, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Returns the canonical (lower-case) form of an option key or resource name.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

// ─────────────────────────────────────────────────────────────────────────────
// OptionValue
// ─────────────────────────────────────────────────────────────────────────────

/// A single value in an option tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// An explicit "no value".
    #[default]
    Null,
    /// A boolean flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    List(Vec<OptionValue>),
    /// A nested option tree.
    Tree(OptionTree),
}

impl OptionValue {
    /// Returns the string slice if this is a [`String`](Self::String).
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Bool`](Self::Bool).
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an [`Int`](Self::Int).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number if this is an [`Int`](Self::Int) or a [`Float`](Self::Float).
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the nested tree if this is a [`Tree`](Self::Tree).
    #[must_use]
    pub fn as_tree(&self) -> Option<&OptionTree> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`List`](Self::List).
    #[must_use]
    pub fn as_list(&self) -> Option<&[OptionValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns true if this is [`Null`](Self::Null).
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this is a nested [`Tree`](Self::Tree).
    #[must_use]
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree(_))
    }

    /// Returns a short description of the value's kind, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Tree(_) => "tree",
        }
    }

    /// Interprets a scalar loosely as a flag: booleans as-is, numbers by
    /// non-zero, and the strings `"1"`, `"true"`, `"on"`, `"yes"`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => matches!(
                s.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            ),
            Self::List(l) => !l.is_empty(),
            Self::Tree(t) => !t.is_empty(),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<OptionTree> for OptionValue {
    fn from(value: OptionTree) -> Self {
        Self::Tree(value)
    }
}

impl<T: Into<OptionValue>> From<Vec<T>> for OptionValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OptionTree
// ─────────────────────────────────────────────────────────────────────────────

/// A nested, insertion-ordered mapping from string key to [`OptionValue`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionTree {
    entries: IndexMap<String, OptionValue>,
}

impl OptionTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Parses a tree from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if the document is not valid
    /// JSON or its top level is not an object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| BootstrapError::configuration(format!("invalid option JSON: {e}")))?;
        Self::from_json_value(value)
    }

    /// Converts a JSON value into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if the value is not an object.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(BootstrapError::configuration(
                "options must be a mapping at the top level",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| BootstrapError::configuration(format!("invalid option tree: {e}")))
    }

    /// Serializes the tree into a JSON value.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Inserts a value under `key`, returning the previous value for that
    /// exact key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Option<OptionValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up a value case-insensitively.
    ///
    /// When several keys differ only in case, the last inserted one wins.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        let wanted = normalize_key(key);
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| normalize_key(k) == wanted)
            .map(|(_, v)| v)
    }

    /// Returns true if a key matches case-insensitively.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes every key matching `key` case-insensitively.
    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        let wanted = normalize_key(key);
        let mut removed = None;
        self.entries.retain(|k, v| {
            if normalize_key(k) == wanted {
                removed = Some(core::mem::take(v));
                false
            } else {
                true
            }
        });
        removed
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over keys in insertion order, with their original spelling.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a copy with top-level keys lower-cased.
    ///
    /// Later keys win when two keys fold to the same spelling.
    #[must_use]
    pub fn lowercase_keys(&self) -> Self {
        let mut entries = IndexMap::with_capacity(self.entries.len());
        for (k, v) in &self.entries {
            entries.insert(normalize_key(k), v.clone());
        }
        Self { entries }
    }

    /// Deep-merges `overlay` into a copy of `self`. See [`merge`].
    #[must_use]
    pub fn merge(&self, overlay: &OptionTree) -> Self {
        merge(self, overlay)
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a OptionTree {
    type Item = (&'a String, &'a OptionValue);
    type IntoIter = indexmap::map::Iter<'a, String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Recursively merges `overlay` on top of `base`.
///
/// For each key in `overlay`: when both sides hold a nested tree the two are
/// merged recursively, otherwise the overlay value replaces the base value.
/// Keys match case-insensitively at every level; a matched key keeps the
/// base's spelling and position, new keys are appended.
#[must_use]
pub fn merge(base: &OptionTree, overlay: &OptionTree) -> OptionTree {
    let mut merged = base.clone();
    for (key, value) in &overlay.entries {
        let wanted = normalize_key(key);
        // The last match is the one `get` sees.
        let existing = merged
            .entries
            .keys()
            .rposition(|k| normalize_key(k) == wanted);
        let Some(index) = existing else {
            merged.entries.insert(key.clone(), value.clone());
            continue;
        };
        let Some((_, slot)) = merged.entries.get_index_mut(index) else {
            continue;
        };
        *slot = match (&*slot, value) {
            (OptionValue::Tree(current), OptionValue::Tree(incoming)) => {
                OptionValue::Tree(merge(current, incoming))
            }
            _ => value.clone(),
        };
    }
    merged
}

/// Returns the set of lower-cased top-level keys of `tree`, in insertion order.
#[must_use]
pub fn flatten_keys(tree: &OptionTree) -> IndexSet<String> {
    tree.entries.keys().map(|k| normalize_key(k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(json: &str) -> OptionTree {
        OptionTree::from_json_str(json).unwrap()
    }

    #[test]
    fn merge_nested_trees_recursively() {
        let merged = merge(&tree(r#"{"x": {"a": 1}}"#), &tree(r#"{"x": {"b": 2}}"#));
        assert_eq!(merged, tree(r#"{"x": {"a": 1, "b": 2}}"#));
    }

    #[test]
    fn merge_replaces_non_tree_values() {
        let merged = merge(&tree(r#"{"x": 1}"#), &tree(r#"{"x": {"a": 1}}"#));
        assert_eq!(merged, tree(r#"{"x": {"a": 1}}"#));

        let merged = merge(&tree(r#"{"x": {"a": 1}}"#), &tree(r#"{"x": "flat"}"#));
        assert_eq!(merged, tree(r#"{"x": "flat"}"#));
    }

    #[test]
    fn merge_is_order_sensitive() {
        let a = tree(r#"{"k": 1}"#);
        let b = tree(r#"{"k": 2}"#);
        assert_eq!(merge(&a, &b).get("k"), Some(&OptionValue::Int(2)));
        assert_eq!(merge(&b, &a).get("k"), Some(&OptionValue::Int(1)));
    }

    #[test]
    fn merge_lists_are_replaced_not_concatenated() {
        let merged = merge(&tree(r#"{"l": [1, 2]}"#), &tree(r#"{"l": [3]}"#));
        assert_eq!(merged.get("l"), Some(&OptionValue::from(vec![3])));
    }

    #[test]
    fn merge_appends_new_keys_in_order() {
        let merged = merge(&tree(r#"{"a": 1, "b": 2}"#), &tree(r#"{"c": 3, "a": 4}"#));
        let keys: Vec<_> = merged.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn merge_matches_keys_case_insensitively() {
        let merged = merge(
            &tree(r#"{"DB": {"Host": "a", "pool": {"Min": 1}}}"#),
            &tree(r#"{"db": {"port": 1, "POOL": {"max": 4}, "host": "b"}}"#),
        );

        let keys: Vec<_> = merged.keys().collect();
        assert_eq!(keys, vec!["DB"]);
        assert_eq!(
            merged,
            tree(r#"{"DB": {"Host": "b", "pool": {"Min": 1, "max": 4}, "port": 1}}"#)
        );
    }

    #[test]
    fn numbers_read_as_floats() {
        let t = tree(r#"{"ratio": 0.5, "count": 3, "name": "x"}"#);
        assert_eq!(t.get("ratio").and_then(OptionValue::as_f64), Some(0.5));
        assert_eq!(t.get("count").and_then(OptionValue::as_f64), Some(3.0));
        assert_eq!(t.get("name").and_then(OptionValue::as_f64), None);
    }

    #[test]
    fn get_is_case_insensitive() {
        let t = tree(r#"{"FrontController": {"baseUrl": "/app"}}"#);
        assert!(t.contains_key("frontcontroller"));
        assert!(t.contains_key("FRONTCONTROLLER"));
        let fc = t.get("frontController").and_then(OptionValue::as_tree).unwrap();
        assert_eq!(fc.get("baseurl").and_then(OptionValue::as_str), Some("/app"));
    }

    #[test]
    fn flatten_keys_lowercases() {
        let keys = flatten_keys(&tree(r#"{"Resources": {}, "pluginPaths": {}}"#));
        assert!(keys.contains("resources"));
        assert!(keys.contains("pluginpaths"));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn lowercase_keys_later_wins() {
        let t = OptionTree::new().with("Key", 1).with("KEY", 2);
        let lowered = t.lowercase_keys();
        assert_eq!(lowered.len(), 1);
        assert_eq!(lowered.get("key"), Some(&OptionValue::Int(2)));
    }

    #[test]
    fn remove_is_case_insensitive() {
        let mut t = OptionTree::new().with("PluginPaths", "x").with("other", 1);
        assert_eq!(t.remove("pluginpaths"), Some(OptionValue::from("x")));
        assert_eq!(t.len(), 1);
        assert!(t.remove("missing").is_none());
    }

    #[test]
    fn json_top_level_must_be_object() {
        assert!(matches!(
            OptionTree::from_json_str("[1, 2]"),
            Err(BootstrapError::Configuration(_))
        ));
        assert!(matches!(
            OptionTree::from_json_str("{not json"),
            Err(BootstrapError::Configuration(_))
        ));
    }

    #[test]
    fn json_value_kinds() {
        let t = tree(r#"{"n": null, "b": true, "i": 3, "f": 1.5, "s": "x", "l": [1], "t": {}}"#);
        let kinds: Vec<_> = t.iter().map(|(_, v)| v.kind()).collect();
        assert_eq!(
            kinds,
            vec!["null", "bool", "integer", "float", "string", "list", "tree"]
        );
        assert_eq!(t.to_json_value()["s"], serde_json::json!("x"));
    }

    #[test]
    fn truthiness() {
        assert!(OptionValue::from("On").is_truthy());
        assert!(OptionValue::from(1).is_truthy());
        assert!(!OptionValue::from("0").is_truthy());
        assert!(!OptionValue::Null.is_truthy());
    }
}
