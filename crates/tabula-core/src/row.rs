//! Row representation.
//!
//! A `Row` is a record resolved against a bound schema: one value per schema
//! column, in schema order.

use std::fmt;
use std::sync::Arc;

use tabula_common::RowId;

use crate::schema::ColumnDescriptor;
use crate::value::Value;

/// A single row of a user-defined table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row identity.
    id: RowId,
    /// Columns of the schema the row was resolved against.
    columns: Arc<[ColumnDescriptor]>,
    /// The values in this row, aligned with `columns`.
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row.
    ///
    /// `values` must be aligned with `columns`; the resolver guarantees this
    /// for every row it returns.
    pub(crate) fn new(id: RowId, columns: Arc<[ColumnDescriptor]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { id, columns, values }
    }

    /// Returns the row id.
    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// Returns the number of columns in this row.
    pub fn num_columns(&self) -> usize {
        self.values.len()
    }

    /// Returns the value at the given index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the value of the named column.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .and_then(|i| self.values.get(i))
    }

    /// Returns the column descriptors.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns all values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Iterates over `(column, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&ColumnDescriptor, &Value)> {
        self.columns.iter().zip(self.values.iter())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: (", self.id)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

/// Sorts rows by id, for callers that need an order independent of the store.
pub fn sort_rows_by_id(rows: &mut [Row]) {
    rows.sort_by(|a, b| a.id.cmp(&b.id));
}
