//! Schema binding.
//!
//! The binder turns a logical table id into a bound [`PhysicalSchema`]:
//!
//! ```text
//!  LogicalTableId
//!       │ normalize
//!       ▼
//!  PhysicalId ──► read catalog columns ──► append fixed columns
//!                                                │ check collisions
//!                                                ▼
//!                       ┌──── schema lock (per physical id) ────┐
//!                       │   engine.create_or_open_relation()    │
//!                       └───────────────────────────────────────┘
//!                                                │
//!                                                ▼
//!                                         PhysicalSchema
//! ```
//!
//! Nothing is cached: every call re-reads the catalog, so a bound schema
//! always reflects the catalog as of that call. Concurrent binders of one
//! table take turns at the engine; since the engine only ever adds columns,
//! the relation ends up with the union of what every binder saw.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tabula_common::{
    BinderConfig, LogicalTableId, PhysicalId, RequestContext, TabulaError, TabulaResult,
    ROW_ID_COLUMN,
};
use tracing::{debug, warn};

use crate::catalog::{ColumnCatalog, ColumnMetadataReader};
use crate::engine::PersistenceEngine;
use crate::identifier::IdentifierNormalizer;
use crate::lock::SchemaLockTable;
use crate::schema::{ColumnDescriptor, FixedSchemaSet, PhysicalSchema};

/// Binds logical tables to physical relations.
pub struct SchemaBinder {
    normalizer: IdentifierNormalizer,
    reader: ColumnMetadataReader,
    engine: Arc<dyn PersistenceEngine>,
    fixed: Arc<FixedSchemaSet>,
    locks: Arc<SchemaLockTable>,
    lock_timeout: Duration,
}

impl SchemaBinder {
    /// Creates a binder with its own lock table.
    ///
    /// The lock table only excludes binders holding the same `Arc`. When more
    /// than one binder talks to `engine`, build one [`SchemaLockTable`] and
    /// hand it to each through [`with_lock_table`](Self::with_lock_table).
    pub fn new(
        catalog: Arc<dyn ColumnCatalog>,
        engine: Arc<dyn PersistenceEngine>,
        fixed: Arc<FixedSchemaSet>,
        config: &BinderConfig,
    ) -> Self {
        Self {
            normalizer: IdentifierNormalizer::new(config),
            reader: ColumnMetadataReader::new(catalog, config.max_identifier_length),
            engine,
            fixed,
            locks: Arc::new(SchemaLockTable::new()),
            lock_timeout: config.schema_lock_timeout(),
        }
    }

    /// Shares `locks` with other binders of the same engine.
    ///
    /// Binders that talk to one engine must share one lock table, otherwise
    /// they do not exclude each other.
    #[must_use]
    pub fn with_lock_table(mut self, locks: Arc<SchemaLockTable>) -> Self {
        self.locks = locks;
        self
    }

    /// Returns the lock table.
    pub fn lock_table(&self) -> &Arc<SchemaLockTable> {
        &self.locks
    }

    /// Returns the identifier normalizer.
    pub fn normalizer(&self) -> &IdentifierNormalizer {
        &self.normalizer
    }

    /// Binds `logical_id` to its physical relation.
    ///
    /// Creates the relation on first use and extends it when the catalog has
    /// gained columns since the last bind. Collisions are reported before
    /// the engine is contacted.
    pub fn bind_schema(
        &self,
        logical_id: &LogicalTableId,
        ctx: &RequestContext,
    ) -> TabulaResult<PhysicalSchema> {
        let physical_id = self.normalizer.normalize(logical_id)?;
        let dynamic = self.reader.read_columns(logical_id, ctx)?;
        let dynamic_len = dynamic.len();
        let columns = self.compose(logical_id, dynamic)?;

        let relation = {
            let _guard = self.locks.acquire(&physical_id, self.lock_timeout)?;
            self.engine
                .create_or_open_relation(&physical_id, &columns, ctx)
                .map_err(|source| {
                    warn!(
                        table_id = %logical_id,
                        physical_id = %physical_id,
                        error = %source,
                        "engine rejected relation definition"
                    );
                    TabulaError::SchemaBind {
                        table_id: logical_id.to_string(),
                        physical_id: physical_id.to_string(),
                        source,
                    }
                })?
        };

        debug!(
            table_id = %logical_id,
            physical_id = %physical_id,
            columns = columns.len(),
            schema_version = relation.schema_version(),
            trace_id = ctx.trace_id(),
            "bound schema"
        );

        Ok(PhysicalSchema::new(
            logical_id.clone(),
            physical_id,
            columns,
            dynamic_len,
            relation,
        ))
    }

    /// Appends the fixed columns and rejects duplicate names.
    fn compose(
        &self,
        logical_id: &LogicalTableId,
        dynamic: Vec<ColumnDescriptor>,
    ) -> TabulaResult<Vec<ColumnDescriptor>> {
        let mut seen = HashSet::with_capacity(dynamic.len());
        for column in &dynamic {
            let reason = if column.name == ROW_ID_COLUMN {
                Some("reserved for the row identity")
            } else if self.fixed.contains(&column.name) {
                Some("collides with a fixed column")
            } else if !seen.insert(column.name.as_str()) {
                Some("declared more than once")
            } else {
                None
            };

            if let Some(reason) = reason {
                warn!(table_id = %logical_id, column = %column.name, reason, "schema conflict");
                return Err(TabulaError::SchemaConflict {
                    table_id: logical_id.to_string(),
                    column: column.name.clone(),
                    reason: reason.to_string(),
                });
            }
        }

        let mut columns = dynamic;
        columns.extend(self.fixed.columns().iter().cloned());
        Ok(columns)
    }

    /// Returns the physical id a logical id binds to, without binding.
    pub fn physical_id(&self, logical_id: &LogicalTableId) -> TabulaResult<PhysicalId> {
        self.normalizer.normalize(logical_id)
    }
}

impl std::fmt::Debug for SchemaBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaBinder")
            .field("normalizer", &self.normalizer)
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}
