//! Core types for the docstore driver
//!
//! This crate defines the backend-agnostic document model:
//! - Value: Closed enum for every dynamic value a row or document can hold
//! - ValueDecoder: Typed, read-only view over one Value
//! - Document: Capability surface that caller documents implement
//! - Query / Filter / FieldPath: Read requests with filters and projections
//! - Action / ActionKind: Units of work in a batch
//! - Error / ErrorCode / BackendError: Error hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod decoder;
pub mod document;
pub mod error;
pub mod query;
pub mod value;

pub use action::{group_actions, group_by_field_paths, Action, ActionKind, GetGroup, GroupedActions, WriteKind};
pub use decoder::ValueDecoder;
pub use document::{Document, MapDocument};
pub use error::{BackendError, Error, ErrorCode, Result};
pub use query::{FieldPath, Filter, FilterOp, Query};
pub use value::Value;

/// One row as returned by a backend: column name to dynamic value.
///
/// Never handed to callers directly; rows always pass through
/// [`ValueDecoder`] into a [`Document`].
pub type RawRow = std::collections::HashMap<String, Value>;
