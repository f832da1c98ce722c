//! # tabula-core
//!
//! Schema binding and row lookup for user-defined tables.
//!
//! A user-defined table has administrator-chosen columns, registered in a
//! column catalog, stored in a generic persistence engine. This crate:
//!
//! - Normalizes logical table ids into physical relation names
//! - Reads a table's columns from the catalog
//! - Appends the fixed bookkeeping columns every table carries
//! - Binds (creates, opens or extends) the physical relation
//! - Resolves row ids against the bound schema, all or nothing
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tabula_common::{BinderConfig, LogicalTableId, RequestContext, RowId};
//! use tabula_core::catalog::{ColumnDefinition, InMemoryCatalog};
//! use tabula_core::engine::MemoryEngine;
//! use tabula_core::TableService;
//!
//! let catalog = Arc::new(InMemoryCatalog::new());
//! let engine = Arc::new(MemoryEngine::new());
//! let service = TableService::new(catalog.clone(), engine, BinderConfig::default()).unwrap();
//!
//! let table = LogicalTableId::new("household_survey");
//! catalog
//!     .define_table(&table, vec![ColumnDefinition::new("village", "string")])
//!     .unwrap();
//!
//! let ctx = RequestContext::new();
//! let schema = service.bind_schema(&table, &ctx).unwrap();
//! assert_eq!(schema.physical_id().as_str(), "UT_HOUSEHOLD__SURVEY");
//! assert_eq!(schema.columns()[0].name, "VILLAGE");
//!
//! let err = service.fetch_rows(&schema, &[RowId::new("uuid:1")], &ctx).unwrap_err();
//! assert!(err.is_not_found());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Schema binding
pub mod binder;

/// Column metadata catalog
pub mod catalog;

/// Persistence engine interface and in-memory engine
pub mod engine;

/// Identifier normalization
pub mod identifier;

/// Per-relation schema locks
pub mod lock;

/// Row resolution
pub mod resolver;

/// Rows
pub mod row;

/// Column descriptors and schemas
pub mod schema;

/// Table service facade
pub mod service;

/// Cell values
pub mod value;

pub use binder::SchemaBinder;
pub use catalog::{ColumnCatalog, ColumnDefinition, ColumnMetadataReader, InMemoryCatalog};
pub use engine::{MemoryEngine, PersistenceEngine, Record, RelationHandle};
pub use identifier::{normalize_column_name, IdentifierNormalizer};
pub use lock::{SchemaLockGuard, SchemaLockStats, SchemaLockTable};
pub use resolver::{sort_rows_by_id, RowResolver};
pub use row::Row;
pub use schema::{
    static_columns, ColumnDescriptor, DataKind, FixedSchemaSet, IndexKind, PhysicalSchema,
};
pub use service::TableService;
pub use value::Value;
