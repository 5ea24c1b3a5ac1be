//! Primary-key schema and key extraction from documents.

use docstore_core::{Document, Error, RawRow, Result, Value};

use crate::backend::{PrimaryKey, PrimaryKeyValue};

/// Which document fields form a table's primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    partition_key: String,
    sort_key: Option<String>,
}

impl KeySchema {
    /// Create a schema.
    pub fn new(partition_key: impl Into<String>, sort_key: Option<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key,
        }
    }

    /// Partition key field name.
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Sort key field name, if the table has one.
    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    /// Number of key columns: 1 or 2.
    pub fn key_count(&self) -> usize {
        if self.sort_key.is_some() {
            2
        } else {
            1
        }
    }

    /// True if `field` is the partition or sort key.
    pub fn is_key_field(&self, field: &str) -> bool {
        field == self.partition_key || self.sort_key.as_deref() == Some(field)
    }

    /// Build the primary key of a document.
    ///
    /// The partition key must be present and non-empty (zero values count
    /// as empty). A configured sort key must be present and non-null. Both
    /// must be strings, integers or bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when a key cannot be extracted.
    pub fn extract(&self, doc: &dyn Document) -> Result<PrimaryKey> {
        let pkey = match doc.get_field(&self.partition_key) {
            Ok(v) if !v.is_empty_key() => v,
            _ => {
                return Err(Error::configuration(format!(
                    "no partition key provided: field {} is missing or empty",
                    self.partition_key
                )))
            }
        };
        let mut key = PrimaryKey::new();
        key.add_column(&self.partition_key, key_value(&self.partition_key, &pkey)?);

        if let Some(sort_key) = &self.sort_key {
            let skey = match doc.get_field(sort_key) {
                Ok(v) if !v.is_null() => v,
                _ => {
                    return Err(Error::configuration(format!(
                        "no sort key provided: field {} is missing",
                        sort_key
                    )))
                }
            };
            key.add_column(sort_key, key_value(sort_key, &skey)?);
        }
        Ok(key)
    }

    /// Drop columns outside `projection`, keeping key columns.
    ///
    /// An empty projection keeps every column.
    pub fn retain_projected(&self, row: &mut RawRow, projection: &[String]) {
        if projection.is_empty() {
            return;
        }
        row.retain(|name, _| self.is_key_field(name) || projection.contains(name));
    }

    /// Check that a lookup key carries a usable partition value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the partition column is missing
    /// or holds a value that counts as unset.
    pub fn check_lookup_key(&self, key: &PrimaryKey) -> Result<()> {
        match key.get(&self.partition_key) {
            Some(value) if !value.to_value().is_empty_key() => Ok(()),
            _ => Err(Error::configuration(format!(
                "no partition key provided: lookup on {} is missing or empty",
                self.partition_key
            ))),
        }
    }
}

/// Convert a key field's value to a key column value.
pub(crate) fn key_value(field: &str, value: &Value) -> Result<PrimaryKeyValue> {
    PrimaryKeyValue::from_value(value).ok_or_else(|| {
        Error::configuration(format!(
            "key field {} has unsupported type {}",
            field,
            value.type_name()
        ))
    })
}
