//! Column metadata catalog.
//!
//! The catalog stores each user-defined table's column definitions in its
//! own native shape (element key + element type). The
//! [`ColumnMetadataReader`] turns those definitions into
//! [`ColumnDescriptor`]s in catalog-declared order.

mod memory;

pub use memory::InMemoryCatalog;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabula_common::{CatalogError, LogicalTableId, RequestContext, TabulaError, TabulaResult};
use tracing::debug;

use crate::identifier::normalize_column_name;
use crate::schema::{ColumnDescriptor, DataKind, IndexKind};

/// A column definition as the catalog stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column key as chosen by the table's owner.
    pub element_key: String,
    /// Element type name, e.g. `"string"`, `"integer"`, `"dateTime"`.
    pub element_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Requested index.
    pub index: IndexKind,
}

impl ColumnDefinition {
    /// Creates a nullable, unindexed definition.
    pub fn new(element_key: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            element_key: element_key.into(),
            element_type: element_type.into(),
            nullable: true,
            index: IndexKind::None,
        }
    }

    /// Marks the column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the requested index.
    pub fn with_index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }
}

/// Source of per-table column definitions.
pub trait ColumnCatalog: Send + Sync {
    /// Lists the column definitions currently registered for a table, in
    /// declared order.
    fn list_columns(
        &self,
        table_id: &LogicalTableId,
        ctx: &RequestContext,
    ) -> Result<Vec<ColumnDefinition>, CatalogError>;
}

/// Reads and converts a table's column definitions.
#[derive(Clone)]
pub struct ColumnMetadataReader {
    catalog: Arc<dyn ColumnCatalog>,
    max_name_len: usize,
}

impl ColumnMetadataReader {
    /// Creates a reader over `catalog`.
    pub fn new(catalog: Arc<dyn ColumnCatalog>, max_name_len: usize) -> Self {
        Self {
            catalog,
            max_name_len,
        }
    }

    /// Reads the table's columns in catalog order.
    ///
    /// Catalog failures are wrapped as `CatalogUnavailable` and never
    /// retried here. A stored key that is not a legal column name is a
    /// `SchemaConflict`.
    pub fn read_columns(
        &self,
        table_id: &LogicalTableId,
        ctx: &RequestContext,
    ) -> TabulaResult<Vec<ColumnDescriptor>> {
        let definitions = self
            .catalog
            .list_columns(table_id, ctx)
            .map_err(|source| TabulaError::CatalogUnavailable {
                table_id: table_id.to_string(),
                source,
            })?;

        definitions
            .iter()
            .map(|def| self.to_descriptor(table_id, def))
            .collect()
    }

    fn to_descriptor(
        &self,
        table_id: &LogicalTableId,
        def: &ColumnDefinition,
    ) -> TabulaResult<ColumnDescriptor> {
        // A bad key is the catalog's defect, not the caller's.
        let name = normalize_column_name(&def.element_key, self.max_name_len).map_err(|e| {
            let reason = match e {
                TabulaError::InvalidIdentifier { reason, .. } => reason,
                other => other.to_string(),
            };
            TabulaError::SchemaConflict {
                table_id: table_id.to_string(),
                column: def.element_key.clone(),
                reason,
            }
        })?;
        let kind = DataKind::from_element_type(&def.element_type).unwrap_or_else(|| {
            debug!(
                table_id = %table_id,
                column = %name,
                element_type = %def.element_type,
                "no dedicated kind for element type, storing as string"
            );
            DataKind::String
        });
        Ok(ColumnDescriptor::new(name, kind, def.nullable).with_index(def.index))
    }
}

impl std::fmt::Debug for ColumnMetadataReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnMetadataReader")
            .field("max_name_len", &self.max_name_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(catalog: Arc<InMemoryCatalog>) -> ColumnMetadataReader {
        ColumnMetadataReader::new(catalog, 63)
    }

    #[test]
    fn test_preserves_catalog_order() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let table = LogicalTableId::new("visits");
        catalog
            .define_table(
                &table,
                vec![
                    ColumnDefinition::new("zeta", "string"),
                    ColumnDefinition::new("alpha", "integer").not_null(),
                    ColumnDefinition::new("mid", "dateTime").with_index(IndexKind::Ordered),
                ],
            )
            .unwrap();

        let columns = reader(catalog)
            .read_columns(&table, &RequestContext::new())
            .unwrap();

        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ZETA", "ALPHA", "MID"]);
        assert_eq!(columns[1].kind, DataKind::Integer);
        assert!(!columns[1].nullable);
        assert_eq!(columns[2].kind, DataKind::DateTime);
        assert_eq!(columns[2].index, IndexKind::Ordered);
    }

    #[test]
    fn test_unknown_element_type_is_string() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let table = LogicalTableId::new("places");
        catalog
            .define_table(&table, vec![ColumnDefinition::new("loc", "geopoint")])
            .unwrap();

        let columns = reader(catalog)
            .read_columns(&table, &RequestContext::new())
            .unwrap();
        assert_eq!(columns[0].kind, DataKind::String);
    }

    #[test]
    fn test_catalog_failure_is_wrapped() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let err = reader(catalog.clone())
            .read_columns(&LogicalTableId::new("missing"), &RequestContext::new())
            .unwrap_err();
        assert!(matches!(
            err,
            TabulaError::CatalogUnavailable {
                source: CatalogError::NotFound { .. },
                ..
            }
        ));

        let table = LogicalTableId::new("t");
        catalog.define_table(&table, Vec::new()).unwrap();
        catalog.set_available(false);
        let err = reader(catalog)
            .read_columns(&table, &RequestContext::new())
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_invalid_column_name() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let table = LogicalTableId::new("t");
        catalog
            .define_table(&table, vec![ColumnDefinition::new("first name", "string")])
            .unwrap();

        let err = reader(catalog)
            .read_columns(&table, &RequestContext::new())
            .unwrap_err();
        match &err {
            TabulaError::SchemaConflict { table_id, column, .. } => {
                assert_eq!(table_id, "t");
                assert_eq!(column, "first name");
            }
            other => panic!("expected SchemaConflict, got {other:?}"),
        }
        assert!(err.is_permanent());
        assert!(!err.is_caller_error());
        assert!(!err.is_retryable());
    }
}
