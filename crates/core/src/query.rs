//! Read requests: filters, projections and the query builder

use std::fmt;

use crate::value::Value;

/// Dotted path to a (possibly nested) document field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Build a path from its segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse a dotted path such as `"stats.wins"`.
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    /// Path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Segments joined with `.`, the form backends use as column names.
    pub fn joined(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath::parse(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        FieldPath::parse(&path)
    }
}

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// Field value is one of an array of values
    In,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterOp::Eq => "=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::In => "in",
        };
        f.write_str(s)
    }
}

/// One predicate of a query's WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field the predicate applies to
    pub field_path: FieldPath,
    /// Comparison operator
    pub op: FilterOp,
    /// Right-hand operand
    pub value: Value,
}

impl Filter {
    /// Create a filter.
    pub fn new(field_path: impl Into<FieldPath>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field_path: field_path.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluate the predicate against a field value.
    ///
    /// `None` (field absent) never matches. Values that cannot be ordered
    /// against the operand never match a range operator.
    pub fn matches(&self, field: Option<&Value>) -> bool {
        use std::cmp::Ordering;

        let Some(field) = field else {
            return false;
        };
        match self.op {
            FilterOp::Eq => field == &self.value,
            FilterOp::In => match &self.value {
                Value::Array(candidates) => candidates.iter().any(|c| c == field),
                _ => false,
            },
            FilterOp::Lt => field.compare(&self.value) == Some(Ordering::Less),
            FilterOp::Le => matches!(
                field.compare(&self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => field.compare(&self.value) == Some(Ordering::Greater),
            FilterOp::Ge => matches!(
                field.compare(&self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field_path, self.op, self.value)
    }
}

/// A read request: unordered filters plus an ordered projection.
///
/// An empty projection means "all fields".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Predicates, all of which must hold
    pub filters: Vec<Filter>,
    /// Requested fields; empty selects every field
    pub field_paths: Vec<FieldPath>,
    /// Maximum number of rows to return
    pub limit: Option<usize>,
}

impl Query {
    /// Create an unfiltered, unprojected query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a filter.
    pub fn filter(
        mut self,
        field_path: impl Into<FieldPath>,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter::new(field_path, op, value));
        self
    }

    /// Builder: append fields to the projection.
    pub fn select<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        self.field_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Builder: cap the number of returned rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
