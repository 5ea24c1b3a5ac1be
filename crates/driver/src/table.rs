//! Collection handle bound to one backend table.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use docstore_core::{Document, Error, Query, Result};

use crate::backend::{ops, Backend, IndexSchema, PrimaryKey, TableDescription, TableMeta};
use crate::config::{CollectionConfig, MissingFieldPolicy};
use crate::key::KeySchema;
use crate::planner::{QueryExecutionPlan, QueryPlanner};

/// An opened collection.
///
/// Schema and index metadata are discovered once by [`Table::open`] and
/// never change afterwards, so a `Table` can be shared by reference across
/// any number of concurrent operations.
pub struct Table {
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) name: String,
    pub(crate) keys: KeySchema,
    pub(crate) missing_field_policy: MissingFieldPolicy,
    description: TableDescription,
    indexes: Vec<IndexSchema>,
}

impl Table {
    /// Open the collection described by `config`.
    ///
    /// Describes the table, checks that the configured key fields match its
    /// declared primary key, and loads every search index schema.
    ///
    /// # Errors
    ///
    /// A configuration error for an invalid config or a key mismatch; a
    /// backend error if discovery fails.
    pub async fn open(backend: Arc<dyn Backend>, config: &CollectionConfig) -> Result<Self> {
        config.validate()?;

        let description = backend
            .describe_table(&config.table)
            .await
            .map_err(|e| Error::backend(ops::DESCRIBE_TABLE, e))?;
        let keys = KeySchema::new(config.partition_key.clone(), config.sort_key.clone());
        check_key_layout(&description.meta, &keys)?;

        let names = backend
            .list_search_indexes(&config.table)
            .await
            .map_err(|e| Error::backend(ops::LIST_SEARCH_INDEX, e))?;
        let mut indexes = Vec::with_capacity(names.len());
        for index_name in &names {
            let schema = backend
                .describe_search_index(&config.table, index_name)
                .await
                .map_err(|e| Error::backend(ops::DESCRIBE_SEARCH_INDEX, e))?;
            debug!(
                target: "tablestore::open",
                table = %config.table,
                index = %index_name,
                fields = schema.fields.len(),
                "loaded search index"
            );
            indexes.push(schema);
        }

        info!(
            target: "tablestore::open",
            table = %config.table,
            partition_key = %keys.partition_key(),
            sort_key = keys.sort_key().unwrap_or("-"),
            indexes = indexes.len(),
            "opened collection"
        );

        Ok(Self {
            backend,
            name: config.table.clone(),
            keys,
            missing_field_policy: config.missing_field_policy,
            description,
            indexes,
        })
    }

    /// Backend table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key fields of this collection.
    pub fn key_schema(&self) -> &KeySchema {
        &self.keys
    }

    /// Declared table layout.
    pub fn meta(&self) -> &TableMeta {
        &self.description.meta
    }

    /// Full table description as discovered at open.
    pub fn description(&self) -> &TableDescription {
        &self.description
    }

    /// Search indexes defined on the table.
    pub fn indexes(&self) -> &[IndexSchema] {
        &self.indexes
    }

    /// Policy for unreadable non-key fields during writes.
    pub fn missing_field_policy(&self) -> MissingFieldPolicy {
        self.missing_field_policy
    }

    /// Primary key of `doc`.
    ///
    /// # Errors
    ///
    /// A configuration error if a key field is missing, empty or of a type
    /// keys cannot hold.
    pub fn key(&self, doc: &dyn Document) -> Result<PrimaryKey> {
        self.keys.extract(doc)
    }

    /// Planner bound to this table.
    pub fn planner(&self) -> QueryPlanner<'_> {
        QueryPlanner::new(&self.name, &self.keys)
    }

    /// Human-readable plan for `query`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedQuery`] when no implemented strategy serves it.
    pub fn query_plan(&self, query: &Query) -> Result<String> {
        match self.planner().plan(query) {
            QueryExecutionPlan::Unsupported { reason } => Err(Error::unsupported_query(reason)),
            plan => Ok(plan.to_string()),
        }
    }

    /// Release the handle. The backend is shared and stays open.
    pub fn close(self) -> Result<()> {
        debug!(target: "tablestore::open", table = %self.name, "closed collection");
        Ok(())
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("keys", &self.keys)
            .field("missing_field_policy", &self.missing_field_policy)
            .field("indexes", &self.indexes.len())
            .finish()
    }
}

/// The configured key fields must name the table's key columns, in order.
fn check_key_layout(meta: &TableMeta, keys: &KeySchema) -> Result<()> {
    let declared: Vec<&str> = meta.primary_key.iter().map(|k| k.name.as_str()).collect();
    let configured: Vec<&str> = std::iter::once(keys.partition_key())
        .chain(keys.sort_key())
        .collect();
    if declared != configured {
        return Err(Error::configuration(format!(
            "table {} has primary key [{}], configured [{}]",
            meta.table_name,
            declared.join(", "),
            configured.join(", ")
        )));
    }
    Ok(())
}
