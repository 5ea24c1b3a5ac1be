//! In-process [`Backend`] implementation.
//!
//! Keeps tables in memory behind `parking_lot` locks, validates requests the
//! way the real engine does (key layout, key types, row-existence
//! conditions, version depth) and records every call in order. Used by the
//! test suites and by hosts that want a local collection.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use docstore_core::{BackendError, ErrorCode, Value};

use super::{
    ops, AttributeColumn, Backend, BackendFuture, BackendResult, GetRowRequest, IndexSchema,
    PrimaryKey, PrimaryKeyValue, PutRowRequest, Row, RowExistenceExpectation, TableDescription,
    TableMeta, TableOptions,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `put_row`
    PutRow {
        /// Target table
        table: String,
        /// Written key
        primary_key: PrimaryKey,
    },
    /// `get_row`
    GetRow {
        /// Target table
        table: String,
        /// Read key
        primary_key: PrimaryKey,
    },
    /// `describe_table`
    DescribeTable {
        /// Target table
        table: String,
    },
    /// `list_search_indexes`
    ListSearchIndex {
        /// Target table
        table: String,
    },
    /// `describe_search_index`
    DescribeSearchIndex {
        /// Target table
        table: String,
        /// Target index
        index: String,
    },
}

impl BackendCall {
    /// Operation name, as in [`ops`].
    pub fn operation(&self) -> &'static str {
        match self {
            BackendCall::PutRow { .. } => ops::PUT_ROW,
            BackendCall::GetRow { .. } => ops::GET_ROW,
            BackendCall::DescribeTable { .. } => ops::DESCRIBE_TABLE,
            BackendCall::ListSearchIndex { .. } => ops::LIST_SEARCH_INDEX,
            BackendCall::DescribeSearchIndex { .. } => ops::DESCRIBE_SEARCH_INDEX,
        }
    }

    /// True for `put_row` calls.
    pub fn is_write(&self) -> bool {
        matches!(self, BackendCall::PutRow { .. })
    }
}

type RowKey = Vec<PrimaryKeyValue>;

struct MemoryTable {
    description: TableDescription,
    indexes: Vec<IndexSchema>,
    rows: BTreeMap<RowKey, BTreeMap<String, Value>>,
}

struct Fault {
    operation: &'static str,
    error: BackendError,
}

/// In-memory storage engine.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, MemoryTable>>,
    calls: Mutex<Vec<BackendCall>>,
    faults: Mutex<Vec<Fault>>,
    latency: Option<Duration>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that sleeps for `latency` inside every row call.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Create a table, replacing any existing table of the same name.
    pub fn create_table(&self, meta: TableMeta) {
        let name = meta.table_name.clone();
        let table = MemoryTable {
            description: TableDescription {
                meta,
                options: TableOptions::default(),
            },
            indexes: Vec::new(),
            rows: BTreeMap::new(),
        };
        self.tables.write().insert(name, table);
    }

    /// Attach a search index to an existing table.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` backend error if the table does not exist.
    pub fn add_search_index(&self, table_name: &str, index: IndexSchema) -> BackendResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        table.indexes.retain(|i| i.name != index.name);
        table.indexes.push(index);
        Ok(())
    }

    /// Make the next call of `operation` fail with `error`.
    ///
    /// Faults queue per operation and fire once each, in order.
    pub fn fail_next(&self, operation: &'static str, error: BackendError) {
        self.faults.lock().push(Fault { operation, error });
    }

    /// Every call so far, in the order the calls started.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of rows stored in a table.
    pub fn row_count(&self, table_name: &str) -> usize {
        self.tables
            .read()
            .get(table_name)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().push(call);
    }

    fn take_fault(&self, operation: &'static str) -> Option<BackendError> {
        let mut faults = self.faults.lock();
        let pos = faults.iter().position(|f| f.operation == operation)?;
        Some(faults.remove(pos).error)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn put_row_sync(&self, request: PutRowRequest) -> BackendResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| table_not_found(&request.table_name))?;
        let key = row_key(&table.description.meta, &request.primary_key)?;

        let exists = table.rows.contains_key(&key);
        match request.condition {
            RowExistenceExpectation::Ignore => {}
            RowExistenceExpectation::ExpectExist if !exists => {
                return Err(BackendError::new(
                    ErrorCode::FailedPrecondition,
                    format!("row {} does not exist", request.primary_key),
                ));
            }
            RowExistenceExpectation::ExpectNotExist if exists => {
                return Err(BackendError::new(
                    ErrorCode::FailedPrecondition,
                    format!("row {} already exists", request.primary_key),
                ));
            }
            _ => {}
        }

        let mut columns = BTreeMap::new();
        for col in request.columns {
            if table
                .description
                .meta
                .primary_key
                .iter()
                .any(|k| k.name == col.name)
            {
                return Err(BackendError::invalid_argument(format!(
                    "attribute column {} collides with a primary key column",
                    col.name
                )));
            }
            columns.insert(col.name, col.value);
        }
        table.rows.insert(key, columns);
        Ok(())
    }

    fn get_row_sync(&self, request: GetRowRequest) -> BackendResult<Option<Row>> {
        if request.max_version == 0 {
            return Err(BackendError::invalid_argument("max_version must be at least 1"));
        }
        let tables = self.tables.read();
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| table_not_found(&request.table_name))?;
        let key = row_key(&table.description.meta, &request.primary_key)?;

        let Some(stored) = table.rows.get(&key) else {
            return Ok(None);
        };
        let columns = stored
            .iter()
            .filter(|(name, _)| {
                request.columns_to_get.is_empty() || request.columns_to_get.contains(*name)
            })
            .map(|(name, value)| AttributeColumn {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(Some(Row {
            primary_key: request.primary_key,
            columns,
        }))
    }
}

impl Backend for MemoryBackend {
    fn put_row(&self, request: PutRowRequest) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.record(BackendCall::PutRow {
                table: request.table_name.clone(),
                primary_key: request.primary_key.clone(),
            });
            self.simulate_latency().await;
            if let Some(err) = self.take_fault(ops::PUT_ROW) {
                return Err(err);
            }
            self.put_row_sync(request)
        })
    }

    fn get_row(&self, request: GetRowRequest) -> BackendFuture<'_, Option<Row>> {
        Box::pin(async move {
            self.record(BackendCall::GetRow {
                table: request.table_name.clone(),
                primary_key: request.primary_key.clone(),
            });
            self.simulate_latency().await;
            if let Some(err) = self.take_fault(ops::GET_ROW) {
                return Err(err);
            }
            self.get_row_sync(request)
        })
    }

    fn describe_table<'a>(&'a self, table_name: &'a str) -> BackendFuture<'a, TableDescription> {
        Box::pin(async move {
            self.record(BackendCall::DescribeTable {
                table: table_name.to_string(),
            });
            if let Some(err) = self.take_fault(ops::DESCRIBE_TABLE) {
                return Err(err);
            }
            self.tables
                .read()
                .get(table_name)
                .map(|t| t.description.clone())
                .ok_or_else(|| table_not_found(table_name))
        })
    }

    fn list_search_indexes<'a>(&'a self, table_name: &'a str) -> BackendFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.record(BackendCall::ListSearchIndex {
                table: table_name.to_string(),
            });
            if let Some(err) = self.take_fault(ops::LIST_SEARCH_INDEX) {
                return Err(err);
            }
            self.tables
                .read()
                .get(table_name)
                .map(|t| t.indexes.iter().map(|i| i.name.clone()).collect())
                .ok_or_else(|| table_not_found(table_name))
        })
    }

    fn describe_search_index<'a>(
        &'a self,
        table_name: &'a str,
        index_name: &'a str,
    ) -> BackendFuture<'a, IndexSchema> {
        Box::pin(async move {
            self.record(BackendCall::DescribeSearchIndex {
                table: table_name.to_string(),
                index: index_name.to_string(),
            });
            if let Some(err) = self.take_fault(ops::DESCRIBE_SEARCH_INDEX) {
                return Err(err);
            }
            let tables = self.tables.read();
            let table = tables
                .get(table_name)
                .ok_or_else(|| table_not_found(table_name))?;
            table
                .indexes
                .iter()
                .find(|i| i.name == index_name)
                .cloned()
                .ok_or_else(|| {
                    BackendError::new(
                        ErrorCode::NotFound,
                        format!("search index {} not found on {}", index_name, table_name),
                    )
                })
        })
    }
}

fn table_not_found(table_name: &str) -> BackendError {
    BackendError::new(
        ErrorCode::NotFound,
        format!("table {} does not exist", table_name),
    )
}

/// Check a key against the table layout and flatten it for storage.
fn row_key(meta: &TableMeta, pk: &PrimaryKey) -> BackendResult<RowKey> {
    if pk.columns.len() != meta.primary_key.len() {
        return Err(BackendError::invalid_argument(format!(
            "primary key has {} columns, table {} expects {}",
            pk.columns.len(),
            meta.table_name,
            meta.primary_key.len()
        )));
    }
    let mut key = Vec::with_capacity(pk.columns.len());
    for (col, schema) in pk.columns.iter().zip(&meta.primary_key) {
        if col.name != schema.name {
            return Err(BackendError::invalid_argument(format!(
                "primary key column {} does not match schema column {}",
                col.name, schema.name
            )));
        }
        if col.value.key_type() != schema.key_type {
            return Err(BackendError::invalid_argument(format!(
                "primary key column {} expects {:?}, got {:?}",
                col.name,
                schema.key_type,
                col.value.key_type()
            )));
        }
        key.push(col.value.clone());
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FieldSchema, FieldType, PrimaryKeyType, ReturnType};

    fn entries_backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.create_table(
            TableMeta::new("entries")
                .with_key("periodId", PrimaryKeyType::String)
                .with_key("userId", PrimaryKeyType::Integer),
        );
        backend
    }

    fn key(period: &str, user: i64) -> PrimaryKey {
        PrimaryKey::new()
            .with_column("periodId", PrimaryKeyValue::String(period.into()))
            .with_column("userId", PrimaryKeyValue::Integer(user))
    }

    fn put(pk: PrimaryKey, cols: Vec<(&str, Value)>, condition: RowExistenceExpectation) -> PutRowRequest {
        PutRowRequest {
            table_name: "entries".into(),
            primary_key: pk,
            columns: cols
                .into_iter()
                .map(|(name, value)| AttributeColumn {
                    name: name.into(),
                    value,
                })
                .collect(),
            condition,
            return_type: ReturnType::None,
        }
    }

    fn get(pk: PrimaryKey, columns: &[&str]) -> GetRowRequest {
        GetRowRequest {
            table_name: "entries".into(),
            primary_key: pk,
            columns_to_get: columns.iter().map(|c| c.to_string()).collect(),
            max_version: 1,
        }
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() {
        let backend = entries_backend();
        backend
            .put_row(put(
                key("P1", 7),
                vec![("nickname", Value::from("alice")), ("isWin", Value::Bool(true))],
                RowExistenceExpectation::Ignore,
            ))
            .await
            .unwrap();

        let row = backend.get_row(get(key("P1", 7), &[])).await.unwrap().unwrap();
        assert_eq!(row.primary_key, key("P1", 7));
        assert_eq!(row.columns.len(), 2);
        assert_eq!(backend.row_count("entries"), 1);
    }

    #[tokio::test]
    async fn test_put_replaces_attribute_columns() {
        let backend = entries_backend();
        backend
            .put_row(put(key("P1", 7), vec![("a", Value::Int(1))], RowExistenceExpectation::Ignore))
            .await
            .unwrap();
        backend
            .put_row(put(key("P1", 7), vec![("b", Value::Int(2))], RowExistenceExpectation::Ignore))
            .await
            .unwrap();

        let row = backend.get_row(get(key("P1", 7), &[])).await.unwrap().unwrap();
        assert_eq!(
            row.columns,
            vec![AttributeColumn {
                name: "b".into(),
                value: Value::Int(2)
            }]
        );
    }

    #[tokio::test]
    async fn test_get_missing_row_is_none() {
        let backend = entries_backend();
        let row = backend.get_row(get(key("P9", 1), &[])).await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_get_respects_columns_to_get() {
        let backend = entries_backend();
        backend
            .put_row(put(
                key("P1", 7),
                vec![("nickname", Value::from("alice")), ("isWin", Value::Bool(true))],
                RowExistenceExpectation::Ignore,
            ))
            .await
            .unwrap();

        let row = backend
            .get_row(get(key("P1", 7), &["nickname"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.columns.len(), 1);
        assert_eq!(row.columns[0].name, "nickname");
    }

    #[tokio::test]
    async fn test_key_validation() {
        let backend = entries_backend();
        let wrong_type = PrimaryKey::new()
            .with_column("periodId", PrimaryKeyValue::String("P1".into()))
            .with_column("userId", PrimaryKeyValue::String("7".into()));
        let err = backend.get_row(get(wrong_type, &[])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);

        let too_short =
            PrimaryKey::new().with_column("periodId", PrimaryKeyValue::String("P1".into()));
        let err = backend
            .put_row(put(too_short, vec![], RowExistenceExpectation::Ignore))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_row_existence_conditions() {
        let backend = entries_backend();
        let err = backend
            .put_row(put(key("P1", 7), vec![], RowExistenceExpectation::ExpectExist))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FailedPrecondition);

        backend
            .put_row(put(key("P1", 7), vec![], RowExistenceExpectation::ExpectNotExist))
            .await
            .unwrap();
        let err = backend
            .put_row(put(key("P1", 7), vec![], RowExistenceExpectation::ExpectNotExist))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FailedPrecondition);
    }

    #[tokio::test]
    async fn test_fault_fires_once_for_its_operation() {
        let backend = entries_backend();
        backend.fail_next(ops::PUT_ROW, BackendError::unavailable("network down"));

        // A get does not consume a put fault.
        assert!(backend.get_row(get(key("P1", 7), &[])).await.is_ok());

        let err = backend
            .put_row(put(key("P1", 7), vec![], RowExistenceExpectation::Ignore))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);

        assert!(backend
            .put_row(put(key("P1", 7), vec![], RowExistenceExpectation::Ignore))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let backend = entries_backend();
        let _ = backend
            .put_row(put(key("P1", 7), vec![], RowExistenceExpectation::Ignore))
            .await;
        let _ = backend.get_row(get(key("P1", 7), &[])).await;
        let _ = backend.describe_table("entries").await;

        let names: Vec<&str> = backend.calls().iter().map(BackendCall::operation).collect();
        assert_eq!(names, vec![ops::PUT_ROW, ops::GET_ROW, ops::DESCRIBE_TABLE]);

        backend.clear_calls();
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_index_discovery() {
        let backend = entries_backend();
        backend
            .add_search_index(
                "entries",
                IndexSchema {
                    name: "by_nickname".into(),
                    fields: vec![FieldSchema::new("nickname", FieldType::Keyword)],
                },
            )
            .unwrap();

        let names = backend.list_search_indexes("entries").await.unwrap();
        assert_eq!(names, vec!["by_nickname".to_string()]);
        let schema = backend
            .describe_search_index("entries", "by_nickname")
            .await
            .unwrap();
        assert!(schema.covers("nickname"));

        let err = backend.describe_search_index("entries", "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let backend = MemoryBackend::new();
        let err = backend.describe_table("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(backend
            .add_search_index(
                "missing",
                IndexSchema {
                    name: "i".into(),
                    fields: vec![]
                }
            )
            .is_err());
    }
}
