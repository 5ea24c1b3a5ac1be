//! Query planning
//!
//! A query is classified once, against the table's key schema, into the
//! narrowest backend access path that serves it correctly. Only primary-key
//! point lookups are executable; every other shape is reported as
//! unsupported rather than downgraded to a scan.

use std::collections::HashSet;
use std::fmt;

use docstore_core::{Filter, FilterOp, Query};

use crate::backend::{GetRowRequest, PrimaryKey, PrimaryKeyValue};
use crate::key::KeySchema;

/// Versions read per column: always the latest only.
pub const LATEST_VERSION_ONLY: u32 = 1;

/// A fully keyed single-row read.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLookup {
    /// Backend request, keyed and projected
    pub request: GetRowRequest,
    /// Non-key filters, evaluated against the fetched row
    pub residual: Vec<Filter>,
    /// Requested columns; empty keeps every column
    pub projection: Vec<String>,
}

/// The access path chosen for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExecutionPlan {
    /// Single-row read by full primary key
    PointLookup(PointLookup),
    /// Primary-key range scan (not implemented)
    RangeScan(Query),
    /// Batched multi-get (not implemented)
    BatchLookup(Query),
    /// Secondary search index query (not implemented)
    SearchQuery(Query),
    /// No strategy serves the query
    Unsupported {
        /// Why the query was rejected
        reason: String,
    },
}

impl QueryExecutionPlan {
    /// Short strategy name.
    pub fn name(&self) -> &'static str {
        match self {
            QueryExecutionPlan::PointLookup(_) => "PointLookup",
            QueryExecutionPlan::RangeScan(_) => "RangeScan",
            QueryExecutionPlan::BatchLookup(_) => "BatchLookup",
            QueryExecutionPlan::SearchQuery(_) => "SearchQuery",
            QueryExecutionPlan::Unsupported { .. } => "Unsupported",
        }
    }

    /// True for the point-lookup strategy.
    pub fn is_point_lookup(&self) -> bool {
        matches!(self, QueryExecutionPlan::PointLookup(_))
    }

    fn unsupported(reason: impl Into<String>) -> Self {
        QueryExecutionPlan::Unsupported {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for QueryExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryExecutionPlan::PointLookup(lookup) => {
                write!(
                    f,
                    "PointLookup(table={}, key=[{}], columns=",
                    lookup.request.table_name, lookup.request.primary_key
                )?;
                if lookup.request.columns_to_get.is_empty() {
                    f.write_str("all")?;
                } else {
                    write!(f, "[{}]", lookup.request.columns_to_get.join(", "))?;
                }
                if !lookup.residual.is_empty() {
                    let residual: Vec<String> =
                        lookup.residual.iter().map(ToString::to_string).collect();
                    write!(f, ", filter=[{}]", residual.join(" AND "))?;
                }
                f.write_str(")")
            }
            QueryExecutionPlan::Unsupported { reason } => write!(f, "Unsupported({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// Chooses an execution plan for queries against one table.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner<'a> {
    table_name: &'a str,
    keys: &'a KeySchema,
}

impl<'a> QueryPlanner<'a> {
    /// Planner for `table_name` with key schema `keys`.
    pub fn new(table_name: &'a str, keys: &'a KeySchema) -> Self {
        Self { table_name, keys }
    }

    /// Number of distinct key fields pinned by an equality filter.
    pub fn key_filter_count(&self, query: &Query) -> usize {
        query
            .filters
            .iter()
            .filter(|f| f.op == FilterOp::Eq)
            .map(|f| f.field_path.joined())
            .filter(|path| self.keys.is_key_field(path))
            .collect::<HashSet<_>>()
            .len()
    }

    /// True if the filters pin every key column.
    pub fn is_point_lookup(&self, query: &Query) -> bool {
        self.key_filter_count(query) == self.keys.key_count()
    }

    /// Classify `query` and build the backend request for it.
    pub fn plan(&self, query: &Query) -> QueryExecutionPlan {
        if !self.is_point_lookup(query) {
            return QueryExecutionPlan::unsupported(match self.keys.sort_key() {
                Some(sk) => format!(
                    "filters must pin both {} and {} with equality",
                    self.keys.partition_key(),
                    sk
                ),
                None => format!(
                    "filters must pin {} with equality",
                    self.keys.partition_key()
                ),
            });
        }

        let mut partition: Option<PrimaryKeyValue> = None;
        let mut sort: Option<PrimaryKeyValue> = None;
        let mut residual = Vec::new();
        for filter in &query.filters {
            let path = filter.field_path.joined();
            let slot = if filter.op != FilterOp::Eq {
                None
            } else if path == self.keys.partition_key() {
                Some(&mut partition)
            } else if self.keys.sort_key() == Some(path.as_str()) {
                Some(&mut sort)
            } else {
                None
            };
            match slot {
                Some(slot) if slot.is_none() => match PrimaryKeyValue::from_value(&filter.value) {
                    Some(value) => *slot = Some(value),
                    None => {
                        return QueryExecutionPlan::unsupported(format!(
                            "key filter on {} has unsupported type {}",
                            path,
                            filter.value.type_name()
                        ))
                    }
                },
                // A repeated key filter is checked against the row like any other.
                _ => residual.push(filter.clone()),
            }
        }

        let mut primary_key = PrimaryKey::new();
        if let Some(value) = partition {
            primary_key.add_column(self.keys.partition_key(), value);
        }
        if let (Some(sk), Some(value)) = (self.keys.sort_key(), sort) {
            primary_key.add_column(sk, value);
        }

        let projection = dedup(query.field_paths.iter().map(|p| p.joined()));
        let columns_to_get = if projection.is_empty() {
            Vec::new()
        } else {
            dedup(
                projection
                    .iter()
                    .cloned()
                    .chain(residual.iter().map(|f| f.field_path.joined()))
                    .filter(|c| !self.keys.is_key_field(c)),
            )
        };

        QueryExecutionPlan::PointLookup(PointLookup {
            request: GetRowRequest {
                table_name: self.table_name.to_string(),
                primary_key,
                columns_to_get,
                max_version: LATEST_VERSION_ONLY,
            },
            residual,
            projection,
        })
    }
}

fn dedup(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.filter(|n| seen.insert(n.clone())).collect()
}
