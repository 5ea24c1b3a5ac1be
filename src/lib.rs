//! tablestore-docstore - document-store driver for wide-column backends
//!
//! Adapts a backend-agnostic document API (documents, queries, batched
//! actions) to a primary-key oriented row store with point reads, range
//! scans, batch gets and search indexes.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tablestore_docstore::{
//!     CollectionConfig, Context, FilterOp, MapDocument, MemoryBackend, PrimaryKeyType, Query,
//!     Table, TableMeta,
//! };
//!
//! let backend = Arc::new(MemoryBackend::new());
//! backend.create_table(
//!     TableMeta::new("entries")
//!         .with_key("periodId", PrimaryKeyType::String)
//!         .with_key("userId", PrimaryKeyType::Integer),
//! );
//!
//! let config = CollectionConfig::new("entries", "periodId").with_sort_key("userId");
//! let table = Table::open(backend, &config).await?;
//! let ctx = Context::background();
//!
//! let doc = MapDocument::new()
//!     .with("periodId", "P1")
//!     .with("userId", 7)
//!     .with("nickname", "alice");
//! table.put(&ctx, &doc).await?;
//!
//! let query = Query::new()
//!     .filter("periodId", FilterOp::Eq, "P1")
//!     .filter("userId", FilterOp::Eq, 7);
//! let mut iter = table.run_get_query(&ctx, &query).await?;
//! let mut out = MapDocument::new();
//! iter.next(&mut out)?;
//! ```
//!
//! # Architecture
//!
//! The backend-neutral model lives in `docstore-core`; the planner, action
//! executor, iterator and backend boundary live in `tablestore-driver`.
//! Only the driver API is re-exported here.

pub use tablestore_driver::*;
