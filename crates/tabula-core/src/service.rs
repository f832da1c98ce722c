//! Table service.
//!
//! Wires a binder and a resolver to one catalog and one engine. This is the
//! surface the rest of the system calls.

use std::sync::Arc;

use tabula_common::{BinderConfig, LogicalTableId, RequestContext, RowId, TabulaResult};
use tracing::info;

use crate::binder::SchemaBinder;
use crate::catalog::ColumnCatalog;
use crate::engine::PersistenceEngine;
use crate::lock::SchemaLockTable;
use crate::resolver::RowResolver;
use crate::row::Row;
use crate::schema::{static_columns, ColumnDescriptor, FixedSchemaSet, PhysicalSchema};

/// Entry point for binding tables and fetching rows.
#[derive(Debug)]
pub struct TableService {
    binder: SchemaBinder,
    resolver: RowResolver,
    config: BinderConfig,
}

impl TableService {
    /// Creates a service after validating `config`.
    ///
    /// The service gets a private lock table, so it is only safe as the sole
    /// binder of `engine`. Services sharing an engine must be built with
    /// [`with_lock_table`](Self::with_lock_table) and one shared table.
    pub fn new(
        catalog: Arc<dyn ColumnCatalog>,
        engine: Arc<dyn PersistenceEngine>,
        config: BinderConfig,
    ) -> TabulaResult<Self> {
        Self::with_lock_table(catalog, engine, config, Arc::new(SchemaLockTable::new()))
    }

    /// Creates a service sharing `locks` with other services of the same
    /// engine.
    pub fn with_lock_table(
        catalog: Arc<dyn ColumnCatalog>,
        engine: Arc<dyn PersistenceEngine>,
        config: BinderConfig,
        locks: Arc<SchemaLockTable>,
    ) -> TabulaResult<Self> {
        config.validate()?;

        let fixed = FixedSchemaSet::shared();
        let binder =
            SchemaBinder::new(catalog, Arc::clone(&engine), fixed, &config).with_lock_table(locks);
        let resolver = RowResolver::new(engine);

        info!(
            namespace_prefix = %config.namespace_prefix,
            max_identifier_length = config.max_identifier_length,
            schema_lock_timeout_ms = config.schema_lock_timeout_ms,
            "table service ready"
        );

        Ok(Self {
            binder,
            resolver,
            config,
        })
    }

    /// Binds a table. See [`SchemaBinder::bind_schema`].
    pub fn bind_schema(
        &self,
        logical_id: &LogicalTableId,
        ctx: &RequestContext,
    ) -> TabulaResult<PhysicalSchema> {
        self.binder.bind_schema(logical_id, ctx)
    }

    /// Fetches rows of a bound table. See [`RowResolver::fetch_rows`].
    pub fn fetch_rows(
        &self,
        schema: &PhysicalSchema,
        ids: &[RowId],
        ctx: &RequestContext,
    ) -> TabulaResult<Vec<Row>> {
        self.resolver.fetch_rows(schema, ids, ctx)
    }

    /// Binds a table, then fetches rows from it.
    pub fn fetch_table_rows(
        &self,
        logical_id: &LogicalTableId,
        ids: &[RowId],
        ctx: &RequestContext,
    ) -> TabulaResult<Vec<Row>> {
        let schema = self.bind_schema(logical_id, ctx)?;
        self.fetch_rows(&schema, ids, ctx)
    }

    /// Returns the fixed columns every table carries.
    pub fn static_columns(&self) -> Arc<[ColumnDescriptor]> {
        static_columns()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Returns the binder.
    pub fn binder(&self) -> &SchemaBinder {
        &self.binder
    }
}
