//! Backend boundary: row primitives and control-plane discovery.
//!
//! The driver talks to the storage engine only through [`Backend`]. Request
//! and response types mirror the engine's wire model: primary keys are an
//! ordered list of typed columns, attribute columns carry dynamic
//! [`Value`]s, reads are single-version.
//!
//! Methods return boxed futures so the trait stays object-safe and a
//! `Arc<dyn Backend>` can be moved into spawned tasks.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use docstore_core::{BackendError, RawRow, Value};

pub mod memory;

pub use memory::{BackendCall, MemoryBackend};

/// Result type for backend primitives
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Future returned by every [`Backend`] method.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = BackendResult<T>> + Send + 'a>>;

/// Operation names used in error wrapping and logs.
pub mod ops {
    /// Row upsert
    pub const PUT_ROW: &str = "PutRow";
    /// Single-row read
    pub const GET_ROW: &str = "GetRow";
    /// Table schema discovery
    pub const DESCRIBE_TABLE: &str = "DescribeTable";
    /// Search index listing
    pub const LIST_SEARCH_INDEX: &str = "ListSearchIndex";
    /// Search index schema discovery
    pub const DESCRIBE_SEARCH_INDEX: &str = "DescribeSearchIndex";
}

// =============================================================================
// Primary keys
// =============================================================================

/// Column types a primary key may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryKeyType {
    /// UTF-8 string
    String,
    /// Signed 64-bit integer
    Integer,
    /// Raw bytes
    Binary,
}

/// Value of one primary-key column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimaryKeyValue {
    /// String key
    String(String),
    /// Integer key
    Integer(i64),
    /// Binary key
    Binary(Vec<u8>),
}

impl PrimaryKeyValue {
    /// Convert a document value; only strings, integers and bytes are keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(PrimaryKeyValue::String(s.clone())),
            Value::Int(i) => Some(PrimaryKeyValue::Integer(*i)),
            Value::Bytes(b) => Some(PrimaryKeyValue::Binary(b.clone())),
            _ => None,
        }
    }

    /// The document value for this key.
    pub fn to_value(&self) -> Value {
        match self {
            PrimaryKeyValue::String(s) => Value::String(s.clone()),
            PrimaryKeyValue::Integer(i) => Value::Int(*i),
            PrimaryKeyValue::Binary(b) => Value::Bytes(b.clone()),
        }
    }

    /// The column type of this key.
    pub fn key_type(&self) -> PrimaryKeyType {
        match self {
            PrimaryKeyValue::String(_) => PrimaryKeyType::String,
            PrimaryKeyValue::Integer(_) => PrimaryKeyType::Integer,
            PrimaryKeyValue::Binary(_) => PrimaryKeyType::Binary,
        }
    }
}

impl fmt::Display for PrimaryKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKeyValue::String(s) => write!(f, "{:?}", s),
            PrimaryKeyValue::Integer(i) => write!(f, "{}", i),
            PrimaryKeyValue::Binary(b) => write!(f, "bytes[{}]", b.len()),
        }
    }
}

/// One named primary-key column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKeyColumn {
    /// Column name
    pub name: String,
    /// Column value
    pub value: PrimaryKeyValue,
}

/// Ordered primary-key tuple: partition key first, then the sort key if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PrimaryKey {
    /// Key columns in schema order
    pub columns: Vec<PrimaryKeyColumn>,
}

impl PrimaryKey {
    /// Create an empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key column.
    pub fn add_column(&mut self, name: impl Into<String>, value: PrimaryKeyValue) {
        self.columns.push(PrimaryKeyColumn {
            name: name.into(),
            value,
        });
    }

    /// Builder form of [`PrimaryKey::add_column`].
    pub fn with_column(mut self, name: impl Into<String>, value: PrimaryKeyValue) -> Self {
        self.add_column(name, value);
        self
    }

    /// Value of a named key column.
    pub fn get(&self, name: &str) -> Option<&PrimaryKeyValue> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.value)
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", col.name, col.value)?;
        }
        Ok(())
    }
}

// =============================================================================
// Rows and requests
// =============================================================================

/// One non-key column.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeColumn {
    /// Column name
    pub name: String,
    /// Column value
    pub value: Value,
}

/// Precondition on the existing row for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowExistenceExpectation {
    /// Write regardless of the existing row
    #[default]
    Ignore,
    /// Fail unless the row exists
    ExpectExist,
    /// Fail if the row exists
    ExpectNotExist,
}

/// What a write returns on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnType {
    /// Nothing
    #[default]
    None,
    /// The written primary key
    PrimaryKey,
}

/// Row upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct PutRowRequest {
    /// Target table
    pub table_name: String,
    /// Key of the row to write
    pub primary_key: PrimaryKey,
    /// Attribute columns; the row's previous attributes are replaced
    pub columns: Vec<AttributeColumn>,
    /// Precondition on the existing row
    pub condition: RowExistenceExpectation,
    /// Requested return payload
    pub return_type: ReturnType,
}

/// Single-row read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRowRequest {
    /// Target table
    pub table_name: String,
    /// Key of the row to read
    pub primary_key: PrimaryKey,
    /// Attribute columns to return; empty returns all
    pub columns_to_get: Vec<String>,
    /// Number of versions per column to return
    pub max_version: u32,
}

/// A row returned by a read.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The row's key columns
    pub primary_key: PrimaryKey,
    /// The row's requested attribute columns
    pub columns: Vec<AttributeColumn>,
}

impl Row {
    /// Flatten key and attribute columns into one column-name map.
    pub fn into_raw_row(self) -> RawRow {
        let mut raw = RawRow::with_capacity(self.primary_key.columns.len() + self.columns.len());
        for pk in self.primary_key.columns {
            raw.insert(pk.name, pk.value.to_value());
        }
        for col in self.columns {
            raw.insert(col.name, col.value);
        }
        raw
    }
}

// =============================================================================
// Schema discovery
// =============================================================================

/// Declared type of one primary-key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeySchema {
    /// Column name
    pub name: String,
    /// Column type
    pub key_type: PrimaryKeyType,
}

/// Table name and primary-key layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    /// Table name
    pub table_name: String,
    /// Key columns in order: partition key first
    pub primary_key: Vec<PrimaryKeySchema>,
}

impl TableMeta {
    /// Create a table with no key columns yet.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: Vec::new(),
        }
    }

    /// Builder: append a key column.
    pub fn with_key(mut self, name: impl Into<String>, key_type: PrimaryKeyType) -> Self {
        self.primary_key.push(PrimaryKeySchema {
            name: name.into(),
            key_type,
        });
        self
    }
}

/// Table-level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Data time-to-live in seconds; -1 keeps data forever
    pub time_to_live: i32,
    /// Versions retained per column
    pub max_versions: u32,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            time_to_live: -1,
            max_versions: 1,
        }
    }
}

/// Result of table discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    /// Name and key layout
    pub meta: TableMeta,
    /// Retention options
    pub options: TableOptions,
}

/// Type of a field in a search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Integer
    Long,
    /// Floating point
    Double,
    /// Boolean
    Boolean,
    /// Exact-match string
    Keyword,
    /// Tokenized full-text string
    Text,
    /// Nested document
    Nested,
    /// Geographic point
    GeoPoint,
}

/// One field of a search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Indexed field name
    pub field_name: String,
    /// Indexed type
    pub field_type: FieldType,
    /// Whether the field is queryable
    pub index: bool,
    /// Whether the field supports sorting and aggregation
    pub enable_sort_and_agg: bool,
}

impl FieldSchema {
    /// A queryable field without sort support.
    pub fn new(field_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field_name: field_name.into(),
            field_type,
            index: true,
            enable_sort_and_agg: false,
        }
    }
}

/// Name and fields of one secondary search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    /// Index name
    pub name: String,
    /// Indexed fields
    pub fields: Vec<FieldSchema>,
}

impl IndexSchema {
    /// True if the index can filter on `field`.
    pub fn covers(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.index && f.field_name == field)
    }
}

// =============================================================================
// Backend trait
// =============================================================================

/// The storage engine as seen by the driver.
///
/// Implementations must be safe to call concurrently; the driver shares one
/// backend across every operation on every table opened against it.
pub trait Backend: Send + Sync {
    /// Write a row, replacing its attribute columns.
    fn put_row(&self, request: PutRowRequest) -> BackendFuture<'_, ()>;

    /// Read one row; `Ok(None)` when no row has the key.
    fn get_row(&self, request: GetRowRequest) -> BackendFuture<'_, Option<Row>>;

    /// Describe a table's key layout and options.
    fn describe_table<'a>(&'a self, table_name: &'a str) -> BackendFuture<'a, TableDescription>;

    /// Names of the search indexes defined on a table.
    fn list_search_indexes<'a>(&'a self, table_name: &'a str) -> BackendFuture<'a, Vec<String>>;

    /// Schema of one search index.
    fn describe_search_index<'a>(
        &'a self,
        table_name: &'a str,
        index_name: &'a str,
    ) -> BackendFuture<'a, IndexSchema>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_value_from_value() {
        assert_eq!(
            PrimaryKeyValue::from_value(&Value::from("P1")),
            Some(PrimaryKeyValue::String("P1".into()))
        );
        assert_eq!(
            PrimaryKeyValue::from_value(&Value::Int(7)),
            Some(PrimaryKeyValue::Integer(7))
        );
        assert_eq!(PrimaryKeyValue::from_value(&Value::Float(7.0)), None);
        assert_eq!(PrimaryKeyValue::from_value(&Value::Bool(true)), None);
    }

    #[test]
    fn test_primary_key_display() {
        let pk = PrimaryKey::new()
            .with_column("periodId", PrimaryKeyValue::String("P1".into()))
            .with_column("userId", PrimaryKeyValue::Integer(7));
        assert_eq!(pk.to_string(), "periodId=\"P1\", userId=7");
        assert_eq!(pk.get("userId"), Some(&PrimaryKeyValue::Integer(7)));
    }

    #[test]
    fn test_row_into_raw_row_merges_key_and_attributes() {
        let row = Row {
            primary_key: PrimaryKey::new()
                .with_column("periodId", PrimaryKeyValue::String("P1".into())),
            columns: vec![AttributeColumn {
                name: "isWin".into(),
                value: Value::Bool(true),
            }],
        };
        let raw = row.into_raw_row();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.get("periodId"), Some(&Value::from("P1")));
        assert_eq!(raw.get("isWin"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_index_covers_only_indexed_fields() {
        let mut hidden = FieldSchema::new("secret", FieldType::Keyword);
        hidden.index = false;
        let index = IndexSchema {
            name: "by_nickname".into(),
            fields: vec![FieldSchema::new("nickname", FieldType::Keyword), hidden],
        };
        assert!(index.covers("nickname"));
        assert!(!index.covers("secret"));
        assert!(!index.covers("userId"));
    }
}
