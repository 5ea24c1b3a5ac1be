//! # Tablestore Driver
//!
//! Adapts the backend-agnostic document model of `docstore-core` to a
//! wide-column row store addressed by primary key.
//!
//! - [`Table`] - An opened collection: key extraction, queries, batches
//! - [`QueryPlanner`] / [`QueryExecutionPlan`] - Picks the access path for a query
//! - [`Table::run_actions`] - Two-phase batch execution, writes before gets
//! - [`DocumentIterator`] - Streams query rows into caller documents
//! - [`Backend`] - The storage engine boundary, with [`MemoryBackend`] in process
//! - [`DriverRegistry`] - Opens collections by scheme
//!
//! ## Access paths
//!
//! | Plan | Served when | Status |
//! |------|-------------|--------|
//! | **PointLookup** | Equality filters pin every key column | Implemented |
//! | **RangeScan** | Key prefix or key range | Unsupported |
//! | **BatchLookup** | Several full keys | Unsupported |
//! | **SearchQuery** | Filters on search-indexed fields | Unsupported |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod context;
mod executor;
pub mod iter;
pub mod key;
pub mod planner;
pub mod registry;
mod runner;
pub mod table;

#[cfg(test)]
mod tests;

pub use backend::{
    Backend, BackendCall, BackendFuture, BackendResult, FieldSchema, FieldType, IndexSchema,
    MemoryBackend, PrimaryKey, PrimaryKeyType, PrimaryKeyValue, TableDescription, TableMeta,
};
pub use config::{CollectionConfig, MissingFieldPolicy, DEFAULT_SCHEME};
pub use context::Context;
pub use iter::DocumentIterator;
pub use key::KeySchema;
pub use planner::{PointLookup, QueryExecutionPlan, QueryPlanner};
pub use registry::{CollectionOpener, DriverRegistry, TablestoreOpener};
pub use table::Table;

// Document model
pub use docstore_core::{
    Action, ActionKind, BackendError, Document, Error, ErrorCode, FieldPath, Filter, FilterOp,
    MapDocument, Query, Result, Value, ValueDecoder, WriteKind,
};
