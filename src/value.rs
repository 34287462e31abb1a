//! Field values held by records.
//!
//! This module provides the dynamic value type stored under record attributes,
//! including the nested-record and constructed-model variants produced by
//! wrap application.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::Record;

/// Represents different types of attribute values in a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Record(Record),
    Model(ModelInstance),
    Null,
}

/// A constructed object produced by a model builder.
///
/// Carries the model name and the nested attributes the object was built
/// from, exposing them as named fields via [`ModelInstance::get`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInstance {
    /// Model name (e.g., "Contact")
    pub name: String,

    /// Attributes the instance was constructed from
    pub attributes: Record,
}

impl ModelInstance {
    pub fn new(name: impl Into<String>, attributes: Record) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Look up a constructed field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl fmt::Display for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.name, self.attributes)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(l) => write!(f, "{:?}", l),
            Value::Record(r) => write!(f, "{:?}", r),
            Value::Model(m) => write!(f, "{}", m),
            Value::Null => write!(f, "null"),
        }
    }
}

impl Value {
    /// Convert a `serde_json::Value` to a `Value`.
    ///
    /// JSON objects become nested records, keeping the document's key order.
    pub fn from_json(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Array(arr) => {
                Value::List(arr.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let record = map
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect();
                Value::Record(record)
            }
            serde_json::Value::Null => Value::Null,
        }
    }

    /// Convert this value to a `serde_json::Value`.
    ///
    /// Model instances serialize as their attributes object; the model name
    /// is a runtime property and is not part of the data representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(l) => serde_json::Value::Array(l.iter().map(Value::to_json).collect()),
            Value::Record(r) => r.to_json(),
            Value::Model(m) => m.attributes.to_json(),
            Value::Null => serde_json::Value::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            Value::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<ModelInstance> for Value {
    fn from(m: ModelInstance) -> Self {
        Value::Model(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(json!("hello")), Value::String("hello".to_string()));
        assert_eq!(Value::from_json(json!(42)), Value::Int(42));
        assert_eq!(Value::from_json(json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from_json(json!(true)), Value::Bool(true));
        assert_eq!(Value::from_json(json!(null)), Value::Null);
    }

    #[test]
    fn test_from_json_object_keeps_order() {
        let value = Value::from_json(json!({"zeta": 1, "alpha": 2, "mid": 3}));

        let record = value.as_record().expect("object should become a record");
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_json_round_trip() {
        let json = json!({
            "name": "Joe",
            "age": 30,
            "tags": ["a", "b"],
            "address": {"city": "Wellington", "zip": "6011"}
        });

        let value = Value::from_json(json.clone());
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_model_instance_get() {
        let mut attributes = Record::new();
        attributes.insert("email", "a@b.com");

        let model = ModelInstance::new("Contact", attributes);

        assert_eq!(model.get("email").and_then(Value::as_str), Some("a@b.com"));
        assert_eq!(model.get("missing"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::String("x".to_string()).to_string(), "x");
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(1).as_str(), None);
        assert_eq!(Value::String("s".to_string()).as_int(), None);
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(false).is_null());
    }
}
