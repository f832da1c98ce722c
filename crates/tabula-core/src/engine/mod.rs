//! Persistence engine interface.
//!
//! The engine owns physical relations and their rows. The binder asks it to
//! create or open a relation for a column list; the resolver asks it for the
//! records matching a set of row ids.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │           SchemaBinder              RowResolver             │
//! │   (create_or_open_relation)       (query_by_ids)            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PersistenceEngine                        │
//! │   relations keyed by PhysicalId, rows keyed by RowId        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod memory;

pub use memory::{EngineStats, MemoryEngine};

use std::collections::HashMap;
use std::fmt;

use tabula_common::{EngineError, PhysicalId, RequestContext, RowId};

use crate::schema::ColumnDescriptor;
use crate::value::Value;

/// Handle to a relation the engine has created or opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationHandle {
    /// Physical relation name.
    physical_id: PhysicalId,
    /// Schema version of the relation when the handle was issued.
    schema_version: u64,
}

impl RelationHandle {
    /// Creates a new handle.
    pub fn new(physical_id: PhysicalId, schema_version: u64) -> Self {
        Self {
            physical_id,
            schema_version,
        }
    }

    /// Returns the physical relation name.
    pub fn physical_id(&self) -> &PhysicalId {
        &self.physical_id
    }

    /// Returns the schema version.
    pub fn schema_version(&self) -> u64 {
        self.schema_version
    }
}

impl fmt::Display for RelationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.physical_id, self.schema_version)
    }
}

/// A raw record as the engine returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Row identity.
    pub id: RowId,
    /// Values by column name.
    pub values: HashMap<String, Value>,
}

impl Record {
    /// Creates a new record.
    pub fn new(id: RowId, values: HashMap<String, Value>) -> Self {
        Self { id, values }
    }
}

/// Storage engine backing physical relations.
pub trait PersistenceEngine: Send + Sync {
    /// Creates the relation if absent, otherwise opens it.
    ///
    /// Must be idempotent for an unchanged column list. Columns missing from
    /// an existing relation are added without touching existing values.
    /// Columns are never removed.
    fn create_or_open_relation(
        &self,
        physical_id: &PhysicalId,
        columns: &[ColumnDescriptor],
        ctx: &RequestContext,
    ) -> Result<RelationHandle, EngineError>;

    /// Returns the records whose identity matches any of `ids`, in a
    /// store-defined order.
    fn query_by_ids(
        &self,
        relation: &RelationHandle,
        ids: &[RowId],
        ctx: &RequestContext,
    ) -> Result<Vec<Record>, EngineError>;
}
