//! Fixed schema set.
//!
//! Every user-defined table carries the same synchronization and bookkeeping
//! columns after its own columns. The set is built once per process and
//! shared read-only by every binder.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::column::{ColumnDescriptor, DataKind, IndexKind};

/// Row version token.
pub const ROW_VERSION: &str = "ROW_VERSION";
/// Data etag of the table at the time the row was created or modified.
pub const DATA_ETAG_AT_MODIFICATION: &str = "DATA_ETAG_AT_MODIFICATION";
/// Identity that created the row.
pub const CREATE_USER: &str = "CREATE_USER";
/// Identity that last updated the row.
pub const LAST_UPDATE_USER: &str = "LAST_UPDATE_USER";
/// Row-level access filter type.
pub const FILTER_TYPE: &str = "FILTER_TYPE";
/// Row-level access filter value.
pub const FILTER_VALUE: &str = "FILTER_VALUE";
/// Soft-delete flag.
pub const DELETED: &str = "DELETED";
/// Access-control URI.
pub const URI_ACCESS_CONTROL: &str = "_URI_ACCESS_CONTROL";
/// Originating form id.
pub const FORM_ID: &str = "_FORM_ID";
/// Instance display name.
pub const INSTANCE_NAME: &str = "_INSTANCE_NAME";
/// Locale the row was captured in.
pub const LOCALE: &str = "_LOCALE";
/// Capture timestamp.
pub const TIMESTAMP: &str = "_TIMESTAMP";

static FIXED_SCHEMA: Lazy<Arc<FixedSchemaSet>> = Lazy::new(|| Arc::new(FixedSchemaSet::build()));

/// The constant list of columns present in every table.
#[derive(Debug)]
pub struct FixedSchemaSet {
    columns: Arc<[ColumnDescriptor]>,
    names: HashSet<String>,
}

impl FixedSchemaSet {
    fn build() -> Self {
        let columns: Vec<ColumnDescriptor> = vec![
            ColumnDescriptor::not_null(ROW_VERSION, DataKind::String),
            ColumnDescriptor::not_null(DATA_ETAG_AT_MODIFICATION, DataKind::String),
            ColumnDescriptor::nullable(CREATE_USER, DataKind::String),
            ColumnDescriptor::nullable(LAST_UPDATE_USER, DataKind::String),
            ColumnDescriptor::nullable(FILTER_TYPE, DataKind::String),
            ColumnDescriptor::nullable(FILTER_VALUE, DataKind::String).with_index(IndexKind::Hash),
            ColumnDescriptor::not_null(DELETED, DataKind::Boolean),
            // Synchronization metadata
            ColumnDescriptor::nullable(URI_ACCESS_CONTROL, DataKind::String),
            ColumnDescriptor::nullable(FORM_ID, DataKind::String),
            ColumnDescriptor::nullable(INSTANCE_NAME, DataKind::String),
            ColumnDescriptor::nullable(LOCALE, DataKind::String),
            ColumnDescriptor::nullable(TIMESTAMP, DataKind::DateTime)
                .with_index(IndexKind::Ordered),
        ];
        let names = columns.iter().map(|c| c.name.clone()).collect();
        Self {
            columns: Arc::from(columns),
            names,
        }
    }

    /// Returns the process-wide instance.
    pub fn shared() -> Arc<FixedSchemaSet> {
        Arc::clone(&FIXED_SCHEMA)
    }

    /// Returns the columns, in order, as an immutable shared view.
    pub fn columns(&self) -> Arc<[ColumnDescriptor]> {
        Arc::clone(&self.columns)
    }

    /// Returns true if `name` is one of the fixed columns.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns the column names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the number of fixed columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; the set is never empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Returns the fixed columns common to every table.
///
/// The returned slice is shared and immutable; every call observes the same
/// list in the same order.
pub fn static_columns() -> Arc<[ColumnDescriptor]> {
    FIXED_SCHEMA.columns()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_length() {
        let names: Vec<_> = FixedSchemaSet::shared().names().map(String::from).collect();
        assert_eq!(
            names,
            vec![
                ROW_VERSION,
                DATA_ETAG_AT_MODIFICATION,
                CREATE_USER,
                LAST_UPDATE_USER,
                FILTER_TYPE,
                FILTER_VALUE,
                DELETED,
                URI_ACCESS_CONTROL,
                FORM_ID,
                INSTANCE_NAME,
                LOCALE,
                TIMESTAMP,
            ]
        );
        assert_eq!(static_columns().len(), 12);
    }

    #[test]
    fn test_repeated_calls_share_one_list() {
        let a = static_columns();
        let b = static_columns();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&FixedSchemaSet::shared(), &FixedSchemaSet::shared()));
    }

    #[test]
    fn test_copies_do_not_leak_mutation() {
        let mut copy = static_columns().to_vec();
        copy[0].name = "TAMPERED".to_string();
        copy.pop();
        assert_eq!(static_columns()[0].name, ROW_VERSION);
        assert_eq!(static_columns().len(), 12);
    }

    #[test]
    fn test_column_properties() {
        let cols = static_columns();
        let find = |name: &str| cols.iter().find(|c| c.name == name).unwrap().clone();

        assert!(!find(ROW_VERSION).nullable);
        assert!(!find(DATA_ETAG_AT_MODIFICATION).nullable);
        assert!(find(CREATE_USER).nullable);
        assert_eq!(find(FILTER_VALUE).index, IndexKind::Hash);
        assert_eq!(find(DELETED).kind, DataKind::Boolean);
        assert!(!find(DELETED).nullable);
        assert_eq!(find(TIMESTAMP).kind, DataKind::DateTime);
        assert_eq!(find(TIMESTAMP).index, IndexKind::Ordered);
        assert!(find(TIMESTAMP).nullable);
    }

    #[test]
    fn test_contains() {
        let fixed = FixedSchemaSet::shared();
        assert!(fixed.contains(DELETED));
        assert!(fixed.contains(LOCALE));
        assert!(!fixed.contains("deleted"));
        assert!(!fixed.is_empty());
    }
}
