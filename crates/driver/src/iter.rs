//! Streaming query results into caller documents.

use docstore_core::{Document, Error, RawRow, Result, Value, ValueDecoder};

/// Cursor over the rows produced by one query.
///
/// Rows are decoded lazily, one per [`DocumentIterator::next`] call. A row
/// that fails to decode is still consumed.
#[derive(Debug, Default)]
pub struct DocumentIterator {
    rows: Vec<RawRow>,
    cursor: usize,
}

impl DocumentIterator {
    /// Iterator over `rows`, in order.
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows, cursor: 0 }
    }

    /// An iterator with no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode the next row into `doc`.
    ///
    /// # Errors
    ///
    /// [`Error::Exhausted`] once every row has been consumed or after
    /// [`DocumentIterator::stop`]. A decode failure is that row's error;
    /// the following call moves on to the next row.
    pub fn next(&mut self, doc: &mut dyn Document) -> Result<()> {
        let Some(slot) = self.rows.get_mut(self.cursor) else {
            return Err(Error::Exhausted);
        };
        let row = std::mem::take(slot);
        self.cursor += 1;
        let value = Value::Object(row);
        doc.decode(ValueDecoder::new(&value))
    }

    /// Release the remaining rows. Safe to call more than once.
    pub fn stop(&mut self) {
        self.rows = Vec::new();
        self.cursor = 0;
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len().saturating_sub(self.cursor)
    }
}
