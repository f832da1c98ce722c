//! Physical schema descriptor.
//!
//! A `PhysicalSchema` is the result of binding a logical table: the ordered
//! union of the table's own columns and the fixed columns, tied to the
//! relation the engine created or opened for it. Only the binder constructs
//! one, so every value of this type is bound.

use std::fmt;
use std::sync::Arc;

use tabula_common::{LogicalTableId, PhysicalId};

use super::column::ColumnDescriptor;
use crate::engine::RelationHandle;

/// A bound physical schema.
#[derive(Debug, Clone)]
pub struct PhysicalSchema {
    logical_id: LogicalTableId,
    physical_id: PhysicalId,
    columns: Arc<[ColumnDescriptor]>,
    dynamic_len: usize,
    relation: RelationHandle,
}

impl PhysicalSchema {
    pub(crate) fn new(
        logical_id: LogicalTableId,
        physical_id: PhysicalId,
        columns: Vec<ColumnDescriptor>,
        dynamic_len: usize,
        relation: RelationHandle,
    ) -> Self {
        Self {
            logical_id,
            physical_id,
            columns: Arc::from(columns),
            dynamic_len,
            relation,
        }
    }

    /// Returns the logical table id.
    pub fn logical_id(&self) -> &LogicalTableId {
        &self.logical_id
    }

    /// Returns the physical relation name.
    pub fn physical_id(&self) -> &PhysicalId {
        &self.physical_id
    }

    /// Returns all columns: table columns first, then fixed columns.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns a shared handle to the column list.
    pub fn shared_columns(&self) -> Arc<[ColumnDescriptor]> {
        Arc::clone(&self.columns)
    }

    /// Returns the columns that came from the catalog.
    pub fn dynamic_columns(&self) -> &[ColumnDescriptor] {
        &self.columns[..self.dynamic_len]
    }

    /// Returns the fixed columns.
    pub fn fixed_columns(&self) -> &[ColumnDescriptor] {
        &self.columns[self.dynamic_len..]
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Finds the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Finds a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the relation handle the schema is bound to.
    pub fn relation(&self) -> &RelationHandle {
        &self.relation
    }
}

impl fmt::Display for PhysicalSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.physical_id)?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", column)?;
        }
        write!(f, "]")
    }
}
