//! Document capability surface
//!
//! A [`Document`] is the caller's in-memory record. The driver reads fields
//! from it for writes and decodes rows into it for reads; it never keeps a
//! reference past a single operation. Identity is the primary-key field
//! values, not object identity.

use std::collections::HashMap;

use crate::decoder::ValueDecoder;
use crate::error::{Error, Result};
use crate::value::Value;

/// A record that can be written to and read from a collection.
pub trait Document: Send {
    /// Value of a top-level field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldNotFound`] if the document has no such field.
    fn get_field(&self, name: &str) -> Result<Value>;

    /// Set a top-level field.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Field names in the document's declared order.
    fn field_names(&self) -> Vec<String>;

    /// Populate this document from a decoded row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the value's shape does not fit.
    fn decode(&mut self, decoder: ValueDecoder<'_>) -> Result<()>;
}

/// Insertion-ordered, dynamically typed document.
///
/// The general-purpose [`Document`] for callers that have no struct of their
/// own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapDocument {
    order: Vec<String>,
    fields: HashMap<String, Value>,
}

impl MapDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add or replace a field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a field, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if !self.fields.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.fields.insert(name, value.into());
    }

    /// Borrow a field's value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let removed = self.fields.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every field.
    pub fn clear(&mut self) {
        self.order.clear();
        self.fields.clear();
    }
}

impl Document for MapDocument {
    fn get_field(&self, name: &str) -> Result<Value> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| Error::FieldNotFound {
                field: name.to_string(),
            })
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.insert(name, value);
        Ok(())
    }

    fn field_names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn decode(&mut self, decoder: ValueDecoder<'_>) -> Result<()> {
        if decoder.map_len().is_none() {
            return Err(Error::decode(format!(
                "expected a mapping, got {}",
                decoder.as_opaque().type_name()
            )));
        }
        // Row entries have no defined order; sort so field order is stable.
        let mut entries: Vec<(&str, Value)> = Vec::new();
        decoder.for_each_map_entry(|key, child, _| {
            entries.push((key, child.as_opaque().clone()));
            true
        });
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in entries {
            self.insert(key, value);
        }
        Ok(())
    }
}

impl From<HashMap<String, Value>> for MapDocument {
    fn from(map: HashMap<String, Value>) -> Self {
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        Self {
            order: names,
            fields: map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_follow_insertion_order() {
        let doc = MapDocument::new()
            .with("periodId", "P1")
            .with("userId", 7)
            .with("nickname", "alice");
        assert_eq!(doc.field_names(), vec!["periodId", "userId", "nickname"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut doc = MapDocument::new().with("a", 1).with("b", 2);
        doc.insert("a", 10);
        assert_eq!(doc.field_names(), vec!["a", "b"]);
        assert_eq!(doc.get("a"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_get_missing_field() {
        let doc = MapDocument::new();
        assert_eq!(
            doc.get_field("nope"),
            Err(Error::FieldNotFound {
                field: "nope".to_string()
            })
        );
    }

    #[test]
    fn test_remove_field() {
        let mut doc = MapDocument::new().with("a", 1).with("b", 2);
        assert_eq!(doc.remove("a"), Some(Value::Int(1)));
        assert_eq!(doc.field_names(), vec!["b"]);
        assert_eq!(doc.remove("a"), None);
    }

    #[test]
    fn test_decode_mapping() {
        let mut row = HashMap::new();
        row.insert("userId".to_string(), Value::Int(7));
        row.insert("periodId".to_string(), Value::from("P1"));
        let row = Value::Object(row);

        let mut doc = MapDocument::new();
        doc.decode(ValueDecoder::new(&row)).unwrap();
        assert_eq!(doc.field_names(), vec!["periodId", "userId"]);
        assert_eq!(doc.get("userId"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_decode_rejects_non_mapping() {
        let mut doc = MapDocument::new();
        let err = doc.decode(ValueDecoder::new(&Value::Int(3))).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_from_hashmap_sorts_names() {
        let mut map = HashMap::new();
        map.insert("z".to_string(), Value::Null);
        map.insert("a".to_string(), Value::Null);
        let doc = MapDocument::from(map);
        assert_eq!(doc.field_names(), vec!["a", "z"]);
    }
}
