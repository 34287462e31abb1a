//! Ordered records.
//!
//! A record is an ordered mapping from attribute name to value, one
//! row/tuple of data. Insertion order is preserved so transformed output is
//! deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// An ordered attribute-name to value mapping.
///
/// Keys are unique. Replacing an existing key keeps its position; removing a
/// key shifts later entries down, so iteration order is always insertion
/// order.
///
/// # Example
/// ```
/// use rewrap::Record;
///
/// let mut record = Record::new();
/// record.insert("id", 1);
/// record.insert("name", "Joe");
///
/// assert_eq!(record.len(), 2);
/// assert_eq!(record.get("name").and_then(|v| v.as_str()), Some("Joe"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attributes: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute.
    ///
    /// Replaces the value in place if the key already exists (position is
    /// kept); appends otherwise. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(key.into(), value.into())
    }

    /// Get an attribute value by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Remove an attribute, preserving the order of the remaining entries.
    ///
    /// Returns the removed value, if the key was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.shift_remove(key)
    }

    /// Check if an attribute is present.
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate attribute names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.attributes.keys()
    }

    /// Iterate attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    /// Keep only the attributes for which the predicate returns true.
    ///
    /// The relative order of the kept attributes is preserved.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.attributes.retain(|key, value| keep(key, value));
    }

    /// Chained insertion, for building records in place.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Build a record from a JSON object.
    ///
    /// Returns `None` if the value is not an object. Key order follows the
    /// JSON document.
    pub fn from_json(value: serde_json::Value) -> Option<Record> {
        match Value::from_json(value) {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Convert this record to a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            attributes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let mut record = Record::new();

        record.insert("id", 1);
        record.insert("name", "Joe");

        assert_eq!(record.len(), 2);
        assert!(record.contains("id"));
        assert_eq!(record.get("id").and_then(Value::as_int), Some(1));
        assert_eq!(record.get("name").and_then(Value::as_str), Some("Joe"));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = Record::new();
        record.insert("a", 1);
        record.insert("b", 2);
        record.insert("c", 3);

        let previous = record.insert("b", 20);

        assert_eq!(previous, Some(Value::Int(2)));
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(record.get("b").and_then(Value::as_int), Some(20));
    }

    #[test]
    fn test_remove_shifts() {
        let mut record = Record::new();
        record.insert("a", 1);
        record.insert("b", 2);
        record.insert("c", 3);

        let removed = record.remove("a");

        assert_eq!(removed, Some(Value::Int(1)));
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_remove_then_insert_appends() {
        let mut record = Record::new();
        record.insert("a", 1);
        record.insert("b", 2);

        record.remove("a");
        record.insert("a", 10);

        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_from_iterator() {
        let record: Record = vec![("id", 1), ("age", 30)].into_iter().collect();

        assert_eq!(record.len(), 2);
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["id", "age"]);
    }

    #[test]
    fn test_retain() {
        let mut record = Record::new();
        record.insert("a", 1);
        record.insert("b", 2);
        record.insert("c", 3);

        record.retain(|key, _| key != "b");

        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_json_interop() {
        let json = json!({"id": 1, "name": "Joe", "nested": {"x": true}});

        let record = Record::from_json(json.clone()).unwrap();

        assert_eq!(record.to_json(), json);
        assert!(Record::from_json(json!([1, 2])).is_none());
    }

    #[test]
    fn test_serde_round_trip() {
        let record = Record::new()
            .with_attribute("name", "Joe")
            .with_attribute("age", 30);

        let serialized = serde_json::to_string(&record).unwrap();
        let deserialized: Record = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, record);
    }
}
