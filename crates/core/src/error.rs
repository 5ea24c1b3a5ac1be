//! Error types for the docstore driver
//!
//! All errors are represented by the [`Error`] enum. Per-action and per-row
//! errors are isolated to their own outcome slot; only batch-level problems
//! abort a whole call.
//!
//! # Categories
//!
//! | Category | Variants | Retried |
//! |----------|----------|---------|
//! | Configuration | `Configuration` | never |
//! | Planning | `UnsupportedQuery` | never |
//! | Backend | `Backend` | never by this crate |
//! | Decoding | `Decode`, `FieldNotFound` | never |
//! | Lookup | `NotFound` | never |
//! | Cursor | `Exhausted` | n/a |
//! | Cancellation | `Cancelled`, `DeadlineExceeded` | never |
//! | Misc | `InvalidInput`, `Internal` | never |

use std::fmt;

use thiserror::Error;

/// Result type alias for docstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Backend-agnostic classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Row, table or index does not exist
    NotFound,
    /// Row or object already exists
    AlreadyExists,
    /// Request was malformed or violated the schema
    InvalidArgument,
    /// A row-existence or similar precondition failed
    FailedPrecondition,
    /// Throttled or quota exceeded
    ResourceExhausted,
    /// Network failure or backend unavailable
    Unavailable,
    /// Deadline passed before the call completed
    DeadlineExceeded,
    /// Caller cancelled the operation
    Cancelled,
    /// Operation is not implemented for this backend or query shape
    Unimplemented,
    /// Invariant violation inside the driver or backend
    Internal,
    /// Anything else
    Unknown,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::InvalidArgument => "invalid_argument",
            ErrorCode::FailedPrecondition => "failed_precondition",
            ErrorCode::ResourceExhausted => "resource_exhausted",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::DeadlineExceeded => "deadline_exceeded",
            ErrorCode::Cancelled => "cancelled",
            ErrorCode::Unimplemented => "unimplemented",
            ErrorCode::Internal => "internal",
            ErrorCode::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Failure reported by a backend primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct BackendError {
    /// Classification of the failure
    pub code: ErrorCode,
    /// Backend-supplied detail
    pub message: String,
}

impl BackendError {
    /// Create a backend error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for a network/availability failure.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, message)
    }

    /// Shorthand for a backend-side validation failure.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }
}

/// Error types for the docstore driver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A document lacks a usable primary-key value, or the collection is
    /// misconfigured
    #[error("configuration error: {reason}")]
    Configuration {
        /// What is wrong
        reason: String,
    },

    /// The query cannot be served by any implemented strategy
    #[error("unsupported query: {reason}")]
    UnsupportedQuery {
        /// Why no strategy applies
        reason: String,
    },

    /// A backend primitive failed
    #[error("{operation} failed: {source}")]
    Backend {
        /// Name of the failing backend operation
        operation: String,
        /// Underlying backend failure
        #[source]
        source: BackendError,
    },

    /// A row did not have the shape the target document expects
    #[error("decode error: {reason}")]
    Decode {
        /// What did not match
        reason: String,
    },

    /// A document has no value for the requested field
    #[error("field not found: {field}")]
    FieldNotFound {
        /// The requested field name
        field: String,
    },

    /// No row exists for the requested primary key
    #[error("document not found: {key}")]
    NotFound {
        /// Rendered primary key
        key: String,
    },

    /// A document iterator has no more rows
    #[error("iterator exhausted")]
    Exhausted,

    /// The operation's context was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// The operation's deadline passed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Caller-supplied input is invalid
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What is invalid
        reason: String,
    },

    /// Bug or invariant violation
    #[error("internal error: {reason}")]
    Internal {
        /// Detail
        reason: String,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Error::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an unsupported-query error.
    pub fn unsupported_query(reason: impl Into<String>) -> Self {
        Error::UnsupportedQuery {
            reason: reason.into(),
        }
    }

    /// Wrap a backend failure with the failing operation's name.
    pub fn backend(operation: impl Into<String>, source: BackendError) -> Self {
        Error::Backend {
            operation: operation.into(),
            source,
        }
    }

    /// Create a decode error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Error::Decode {
            reason: reason.into(),
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Error::Internal {
            reason: reason.into(),
        }
    }

    /// True for the iterator's end-of-rows sentinel.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::Exhausted)
    }

    /// Classify this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Configuration { .. } => ErrorCode::InvalidArgument,
            Error::UnsupportedQuery { .. } => ErrorCode::Unimplemented,
            Error::Backend { source, .. } => source.code,
            Error::Decode { .. } => ErrorCode::InvalidArgument,
            Error::FieldNotFound { .. } => ErrorCode::NotFound,
            Error::NotFound { .. } => ErrorCode::NotFound,
            Error::Exhausted => ErrorCode::NotFound,
            Error::Cancelled => ErrorCode::Cancelled,
            Error::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            Error::InvalidInput { .. } => ErrorCode::InvalidArgument,
            Error::Internal { .. } => ErrorCode::Internal,
        }
    }
}
