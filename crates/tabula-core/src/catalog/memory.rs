//! In-memory column catalog.
//!
//! Holds column definitions per logical table. Used for tests and for
//! embedding the binder without an external catalog service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use tabula_common::{CatalogError, LogicalTableId, RequestContext};

use super::{ColumnCatalog, ColumnDefinition};

/// Column catalog backed by a map.
#[derive(Debug)]
pub struct InMemoryCatalog {
    /// Definitions by table, in declared order.
    tables: RwLock<HashMap<LogicalTableId, Vec<ColumnDefinition>>>,
    /// Cleared to simulate an unreachable catalog.
    available: AtomicBool,
    /// Number of `list_columns` calls served.
    reads: AtomicU64,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            reads: AtomicU64::new(0),
        }
    }

    /// Registers a table with its column definitions.
    pub fn define_table(
        &self,
        table: &LogicalTableId,
        columns: Vec<ColumnDefinition>,
    ) -> Result<(), CatalogError> {
        let mut tables = self.tables.write();

        if tables.contains_key(table) {
            return Err(CatalogError::AlreadyDefined {
                table: table.to_string(),
            });
        }

        tables.insert(table.clone(), columns);
        Ok(())
    }

    /// Appends a column definition to a registered table.
    ///
    /// The catalog does not check for duplicate keys; the binder does.
    pub fn add_column(
        &self,
        table: &LogicalTableId,
        column: ColumnDefinition,
    ) -> Result<(), CatalogError> {
        let mut tables = self.tables.write();

        if let Some(columns) = tables.get_mut(table) {
            columns.push(column);
            Ok(())
        } else {
            Err(CatalogError::NotFound {
                table: table.to_string(),
            })
        }
    }

    /// Removes a table and returns its definitions.
    pub fn drop_table(
        &self,
        table: &LogicalTableId,
    ) -> Result<Vec<ColumnDefinition>, CatalogError> {
        self.tables
            .write()
            .remove(table)
            .ok_or_else(|| CatalogError::NotFound {
                table: table.to_string(),
            })
    }

    /// Lists all registered tables.
    pub fn list_tables(&self) -> Vec<LogicalTableId> {
        self.tables.read().keys().cloned().collect()
    }

    /// Makes the catalog reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns how many column listings have been served.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnCatalog for InMemoryCatalog {
    fn list_columns(
        &self,
        table_id: &LogicalTableId,
        ctx: &RequestContext,
    ) -> Result<Vec<ColumnDefinition>, CatalogError> {
        if ctx.is_cancelled() || ctx.deadline_exceeded() {
            return Err(CatalogError::Cancelled);
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable {
                reason: "catalog is offline".to_string(),
            });
        }

        self.reads.fetch_add(1, Ordering::Relaxed);
        self.tables
            .read()
            .get(table_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                table: table_id.to_string(),
            })
    }
}
